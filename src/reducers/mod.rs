pub mod channels;
pub mod rows;
pub mod sandbox;
