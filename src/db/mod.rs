pub mod db;
pub mod jobdb;
#[cfg(test)]
pub mod memorydb;
pub mod paymentdb;
pub mod userdb;
