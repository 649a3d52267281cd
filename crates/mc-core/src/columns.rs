//! Column labels of sample and windowed tables.

pub const TIME: &str = "time";
pub const MAX_TEMPERATURE: &str = "max_temperature";
pub const MAX_POS_X: &str = "max_pos_x";
pub const MAX_POS_Y: &str = "max_pos_y";
pub const MIN_TEMPERATURE: &str = "min_temperature";
pub const MIN_POS_X: &str = "min_pos_x";
pub const MIN_POS_Y: &str = "min_pos_y";
/// Derived displacement between consecutive samples.
pub const DISTANCE: &str = "distance";

/// Raw CSV column order.
pub const SAMPLE_COLUMNS: [&str; 7] = [
    TIME,
    MAX_TEMPERATURE,
    MAX_POS_X,
    MAX_POS_Y,
    MIN_TEMPERATURE,
    MIN_POS_X,
    MIN_POS_Y,
];

/// Numeric columns reduced by window aggregation.
pub const WINDOW_COLUMNS: [&str; 7] = [
    MAX_TEMPERATURE,
    MAX_POS_X,
    MAX_POS_Y,
    MIN_TEMPERATURE,
    MIN_POS_X,
    MIN_POS_Y,
    DISTANCE,
];

/// Label of a windowed mean column, e.g. `distance_mean`.
pub fn mean_of(column: &str) -> String {
    format!("{}{}", column, crate::table::MEAN_SUFFIX)
}

/// Label of a windowed standard deviation column.
pub fn std_of(column: &str) -> String {
    format!("{}{}", column, crate::table::STD_SUFFIX)
}
