//! Number format types

/// First id available to formats defined by the workbook itself
pub const FIRST_CUSTOM_ID: u32 = 164;

/// Number format of a cell, as referenced by its cell style
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum NumberFormat {
    /// General format (default)
    #[default]
    General,

    /// Built-in format by ID (14 = short date, 22 = date and time, ...)
    BuiltIn(u32),

    /// Format code defined in the workbook's `numFmts` table
    Custom(String),
}

impl NumberFormat {
    /// Resolve a `numFmtId`; ids with an entry in the workbook's table are custom
    pub fn from_id(id: u32, custom_code: Option<&str>) -> Self {
        match (id, custom_code) {
            (_, Some(code)) => NumberFormat::Custom(code.to_string()),
            (0, None) => NumberFormat::General,
            (id, None) => NumberFormat::BuiltIn(id),
        }
    }

    pub fn is_general(&self) -> bool {
        matches!(self, NumberFormat::General)
    }

    /// Format code; built-in ids not in the standard table read as `General`
    pub fn code(&self) -> &str {
        match self {
            NumberFormat::General => "General",
            NumberFormat::BuiltIn(id) => builtin_format_code(*id),
            NumberFormat::Custom(code) => code,
        }
    }
}

fn builtin_format_code(id: u32) -> &'static str {
    match id {
        1 => "0",
        2 => "0.00",
        3 => "#,##0",
        4 => "#,##0.00",
        9 => "0%",
        10 => "0.00%",
        11 => "0.00E+00",
        12 => "# ?/?",
        13 => "# ??/??",
        14 => "mm-dd-yy",
        15 => "d-mmm-yy",
        16 => "d-mmm",
        17 => "mmm-yy",
        18 => "h:mm AM/PM",
        19 => "h:mm:ss AM/PM",
        20 => "h:mm",
        21 => "h:mm:ss",
        22 => "m/d/yy h:mm",
        45 => "mm:ss",
        46 => "[h]:mm:ss",
        47 => "mmss.0",
        49 => "@",
        _ => "General",
    }
}
