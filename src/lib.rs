//! Merge and reconcile the bilingual (English/French) NOC classification
//! exports into single bilingual tables.

pub mod combine;
pub mod config;
pub mod exit_codes;
pub mod export;
pub mod i18n;
pub mod matcher;
pub mod reconcile;
pub mod record;
pub mod retry;
pub mod table;
pub mod tools;
pub mod translation;
