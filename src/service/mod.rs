pub mod error;
pub mod job_service;
pub mod listing_service;
pub mod notification_service;
pub mod payment_gateway;
pub mod payment_service;
pub mod proposal_service;
