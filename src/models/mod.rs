use thiserror::Error;

pub mod address;
pub mod bar;
pub mod event;

/// Why a record was refused before being written.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("A bar should at least have table games or video games")]
    BarWithoutGames,
    #[error("A Belgian zip code must be made of 4 digits")]
    InvalidZipCode,
}
