//! UK Inheritance Tax calculation for estates, lifetime gifts and trusts.

pub mod core;
