//! `SeaORM` entity definitions.

pub mod accounts;
pub mod items;
pub mod movements;
