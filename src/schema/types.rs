//! Table and column descriptors for bacpac exports.
//!
//! The schema loader (outside this crate) turns a bacpac `model.xml` into an
//! ordered list of [`TableColumn`]s per table. These descriptors are all the
//! decoder knows about a column's bytes.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::SchemaError;

/// Logical SQL Server data type of a column.
///
/// This list is what the model files of real exports have been observed to
/// contain; it is not every type SQL Server supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    BigInt,
    Binary,
    Bit,
    Char,
    Date,
    Datetime,
    DatetimeOffset,
    Datetime2,
    Decimal,
    Float,
    Geography,
    Int,
    Money,
    NChar,
    NText,
    Numeric,
    NVarchar,
    Real,
    SmallDatetime,
    SmallInt,
    SmallMoney,
    SQLVariant,
    Time,
    Text,
    TinyInt,
    UniqueIdentifier,
    Varbinary,
    Varchar,
}

impl DataType {
    /// Every data type, in declaration order.
    pub const ALL: [DataType; 28] = [
        DataType::BigInt,
        DataType::Binary,
        DataType::Bit,
        DataType::Char,
        DataType::Date,
        DataType::Datetime,
        DataType::DatetimeOffset,
        DataType::Datetime2,
        DataType::Decimal,
        DataType::Float,
        DataType::Geography,
        DataType::Int,
        DataType::Money,
        DataType::NChar,
        DataType::NText,
        DataType::Numeric,
        DataType::NVarchar,
        DataType::Real,
        DataType::SmallDatetime,
        DataType::SmallInt,
        DataType::SmallMoney,
        DataType::SQLVariant,
        DataType::Time,
        DataType::Text,
        DataType::TinyInt,
        DataType::UniqueIdentifier,
        DataType::Varbinary,
        DataType::Varchar,
    ];

    /// The type name as it appears in `model.xml` (without the `sys.` prefix).
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::BigInt => "bigint",
            DataType::Binary => "binary",
            DataType::Bit => "bit",
            DataType::Char => "char",
            DataType::Date => "date",
            DataType::Datetime => "datetime",
            DataType::DatetimeOffset => "datetimeoffset",
            DataType::Datetime2 => "datetime2",
            DataType::Decimal => "decimal",
            DataType::Float => "float",
            DataType::Geography => "geography",
            DataType::Int => "int",
            DataType::Money => "money",
            DataType::NChar => "nchar",
            DataType::NText => "ntext",
            DataType::Numeric => "numeric",
            DataType::NVarchar => "nvarchar",
            DataType::Real => "real",
            DataType::SmallDatetime => "smalldatetime",
            DataType::SmallInt => "smallint",
            DataType::SmallMoney => "smallmoney",
            DataType::SQLVariant => "sql_variant",
            DataType::Time => "time",
            DataType::Text => "text",
            DataType::TinyInt => "tinyint",
            DataType::UniqueIdentifier => "uniqueidentifier",
            DataType::Varbinary => "varbinary",
            DataType::Varchar => "varchar",
        }
    }

    /// Fixed storage width for integer types.
    pub fn integer_width(&self) -> Option<usize> {
        match self {
            DataType::TinyInt => Some(1),
            DataType::SmallInt => Some(2),
            DataType::Int => Some(4),
            DataType::BigInt => Some(8),
            _ => None,
        }
    }

    /// Whether values are stored as two-byte characters.
    pub fn is_character(&self) -> bool {
        matches!(
            self,
            DataType::Char
                | DataType::NChar
                | DataType::Varchar
                | DataType::NVarchar
                | DataType::Text
                | DataType::NText
        )
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = SchemaError;

    /// Parse a model type name such as `int`, `[sys].[nvarchar]` or
    /// `sys.datetime2`. Matching is case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace("].[", ".");
        let normalized = normalized.trim().trim_matches(|c| c == '[' || c == ']');
        let normalized = normalized.to_ascii_lowercase();
        let name = normalized.strip_prefix("sys.").unwrap_or(&normalized);

        DataType::ALL
            .iter()
            .copied()
            .find(|dt| dt.as_str() == name)
            .ok_or_else(|| SchemaError::UnsupportedType(s.to_string()))
    }
}

/// Definition of one exported column.
///
/// Read-only during decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    /// Column name.
    pub name: String,
    /// Logical data type.
    pub data_type: DataType,
    /// The type name as declared in the model (used in error messages).
    pub type_name: String,
    /// Declared maximum length, in characters for character types.
    pub length: usize,
    /// Decimal scale, or fractional-second digits for time types.
    pub scale: u8,
    /// Decimal or float precision.
    pub precision: u8,
    /// Whether the column accepts NULL.
    pub is_nullable: bool,
    /// Whether the column's byte stream is known to contain spurious bytes.
    pub is_adulterated: bool,
}

impl TableColumn {
    /// Create a nullable column with no length, scale or precision.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            type_name: data_type.as_str().to_string(),
            length: 0,
            scale: 0,
            precision: 0,
            is_nullable: true,
            is_adulterated: false,
        }
    }

    /// Set the declared length.
    pub fn with_length(mut self, length: usize) -> Self {
        self.length = length;
        self
    }

    /// Set the scale.
    pub fn with_scale(mut self, scale: u8) -> Self {
        self.scale = scale;
        self
    }

    /// Set the precision.
    pub fn with_precision(mut self, precision: u8) -> Self {
        self.precision = precision;
        self
    }

    /// Set nullability.
    pub fn with_nullable(mut self, is_nullable: bool) -> Self {
        self.is_nullable = is_nullable;
        self
    }

    /// Mark the column as NOT NULL.
    pub fn not_null(self) -> Self {
        self.with_nullable(false)
    }

    /// Flag the column as adulterated.
    pub fn adulterated(mut self) -> Self {
        self.is_adulterated = true;
        self
    }

    /// Override the declared type name (e.g. for user-defined types).
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }
}

/// An exported table: its qualified name and ordered columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDef {
    /// Owning schema (e.g. `dbo`).
    pub schema: String,
    /// Table name.
    pub name: String,
    /// Columns in storage order.
    pub columns: Vec<TableColumn>,
}

impl TableDef {
    /// Create a table definition.
    pub fn new(
        schema: impl Into<String>,
        name: impl Into<String>,
        columns: Vec<TableColumn>,
    ) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns,
        }
    }

    /// `schema.table`, the key used by exception lists and data directories.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// The directory holding this table's BCP files inside an unzipped bacpac.
    pub fn data_dir(&self, base_dir: impl AsRef<Path>) -> PathBuf {
        base_dir.as_ref().join("Data").join(self.qualified_name())
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&TableColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_type_names() {
        assert_eq!("int".parse::<DataType>().unwrap(), DataType::Int);
        assert_eq!("NVARCHAR".parse::<DataType>().unwrap(), DataType::NVarchar);
        assert_eq!("sys.datetime2".parse::<DataType>().unwrap(), DataType::Datetime2);
        assert_eq!("[sys].[money]".parse::<DataType>().unwrap(), DataType::Money);
        assert_eq!("[sql_variant]".parse::<DataType>().unwrap(), DataType::SQLVariant);
        assert!(matches!(
            "hierarchyid".parse::<DataType>(),
            Err(SchemaError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_type_names_are_distinct() {
        for dt in DataType::ALL {
            assert_eq!(dt.as_str().parse::<DataType>().unwrap(), dt);
        }
    }

    #[test]
    fn test_integer_width() {
        assert_eq!(DataType::TinyInt.integer_width(), Some(1));
        assert_eq!(DataType::BigInt.integer_width(), Some(8));
        assert_eq!(DataType::Money.integer_width(), None);
    }

    #[test]
    fn test_column_builder() {
        let col = TableColumn::new("price", DataType::Decimal)
            .with_precision(10)
            .with_scale(2)
            .not_null();
        assert_eq!(col.type_name, "decimal");
        assert_eq!(col.precision, 10);
        assert_eq!(col.scale, 2);
        assert!(!col.is_nullable);
        assert!(!col.is_adulterated);
    }

    #[test]
    fn test_table_paths() {
        let table = TableDef::new("dbo", "orders", vec![TableColumn::new("id", DataType::Int)]);
        assert_eq!(table.qualified_name(), "dbo.orders");
        assert_eq!(
            table.data_dir("/exports/db"),
            PathBuf::from("/exports/db/Data/dbo.orders")
        );
        assert!(table.column("id").is_some());
        assert!(table.column("missing").is_none());
    }
}
