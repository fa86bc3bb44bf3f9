pub mod jobmodel;
pub mod paymentmodel;
pub mod usermodel;
