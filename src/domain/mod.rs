pub mod blend;
pub mod card;
pub mod fade;
pub mod fixed;
pub mod warp;
