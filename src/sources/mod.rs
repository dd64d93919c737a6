use crate::error::Result;

pub trait Source {
    type Item;

    fn scan(&self) -> Result<Vec<Self::Item>>;
}

pub mod desktop;
pub mod bin;
pub mod bar;
