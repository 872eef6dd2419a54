//! Imputation module for handling missing values.
//!
//! Numeric nulls are filled with the mean of their group, see
//! [`GroupedMeanImputer`].

mod grouped;

pub use grouped::GroupedMeanImputer;
