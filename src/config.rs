pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// How the `discount` column is encoded in the source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum DiscountUnit {
    /// Decide from the column maximum (> 1 means percent). Logged when used.
    #[default]
    Auto,
    /// Values are already fractions in [0, 1].
    Fraction,
    /// Values are percentages in [0, 100].
    Percent,
}

impl DiscountUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountUnit::Auto => "auto",
            DiscountUnit::Fraction => "fraction",
            DiscountUnit::Percent => "percent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub discount_unit: DiscountUnit,
    /// Number of trailing days averaged in the daily trend.
    pub rolling_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            discount_unit: DiscountUnit::Auto,
            rolling_window: DEFAULT_ROLLING_WINDOW,
        }
    }
}

impl PipelineConfig {
    pub fn with_discount_unit(mut self, unit: DiscountUnit) -> Self {
        self.discount_unit = unit;
        self
    }
}
