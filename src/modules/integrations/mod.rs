pub mod aladin;

pub use aladin::AladinClient;
