pub mod analyze;
pub mod enums;
pub mod normalize;
pub mod profiles;
