//! Column type declaration parser.
//!
//! Turns a declaration as sent in the row-binary header, such as
//! `Array(Nullable(Int32))`, `Enum8('a' = 1, 'b' = 2)` or
//! `DateTime64(3, 'UTC')`, into a [`ColumnType`] tree.
//!
//! Every node keeps the substring it was parsed from in
//! [`source_type`][ColumnType::source_type], so parsing that substring again
//! yields the same node.
use std::{borrow::Cow, collections::BTreeMap, fmt};

/// Parsed column type declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType {
    /// The type family and its structural data.
    pub kind: TypeKind,
    /// The declaration this node was parsed from.
    pub source_type: String,
}

/// Column type family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeKind {
    /// Leaf scalar, e.g. `UInt8`, `String` or `Bool`.
    Simple { name: String },
    Nullable { inner: Box<ColumnType> },
    /// Dictionary encoding is invisible in row-binary, values decode as `inner`.
    LowCardinality { inner: Box<ColumnType> },
    /// `Array(Array(T))` collapse into one node with `dimensions` 2.
    Array { inner: Box<ColumnType>, dimensions: u32 },
    Map { key: Box<ColumnType>, value: Box<ColumnType> },
    Tuple { elements: Vec<TupleElement> },
    /// Index to name.
    Enum { int_size: EnumSize, values: BTreeMap<i16, String> },
    Decimal { precision: u8, scale: u8, int_size: DecimalSize },
    FixedString { size_bytes: u32 },
    DateTime { timezone: Option<String> },
    DateTime64 { precision: u8, timezone: Option<String> },
}

/// An element of a `Tuple`, optionally named.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TupleElement {
    pub name: Option<String>,
    pub ty: ColumnType,
}

/// Integer width of an `Enum`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumSize {
    Enum8,
    Enum16,
}

/// Integer width of a `Decimal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalSize {
    Decimal32,
    Decimal64,
    Decimal128,
    Decimal256,
}

impl EnumSize {
    /// Size in bits.
    pub const fn bits(self) -> u32 {
        match self {
            EnumSize::Enum8 => 8,
            EnumSize::Enum16 => 16,
        }
    }
}

impl DecimalSize {
    /// Size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            DecimalSize::Decimal32 => 4,
            DecimalSize::Decimal64 => 8,
            DecimalSize::Decimal128 => 16,
            DecimalSize::Decimal256 => 32,
        }
    }

    fn from_precision(precision: u8) -> Option<DecimalSize> {
        match precision {
            1..=9 => Some(DecimalSize::Decimal32),
            10..=18 => Some(DecimalSize::Decimal64),
            19..=38 => Some(DecimalSize::Decimal128),
            39..=76 => Some(DecimalSize::Decimal256),
            _ => None,
        }
    }

    const fn max_precision(self) -> u8 {
        match self {
            DecimalSize::Decimal32 => 9,
            DecimalSize::Decimal64 => 18,
            DecimalSize::Decimal128 => 38,
            DecimalSize::Decimal256 => 76,
        }
    }
}

impl ColumnType {
    /// Returns the simple type name if this is a [`TypeKind::Simple`].
    pub fn simple_name(&self) -> Option<&str> {
        match &self.kind {
            TypeKind::Simple { name } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source_type)
    }
}

impl std::str::FromStr for ColumnType {
    type Err = ParseTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_type(s)
    }
}

/// Parse column type declaration.
///
/// # Errors
///
/// Any declaration outside the supported grammar is rejected, there is no
/// silent fallback. The error reason names the type family and what is wrong
/// with it, e.g. `Invalid FixedString size in bytes`.
pub fn parse_type(declaration: &str) -> Result<ColumnType, ParseTypeError> {
    Parser { source_type: declaration }.parse(declaration)
}

struct Parser<'a> {
    source_type: &'a str,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<Cow<'static, str>>, column_type: &str) -> ParseTypeError {
        ParseTypeError {
            reason: reason.into(),
            column_type: column_type.to_owned(),
            source_type: self.source_type.to_owned(),
        }
    }

    fn parse(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let column_type = column_type.trim();
        let family = match column_type.find('(') {
            Some(idx) => &column_type[..idx],
            None => column_type,
        };

        match family {
            "Array" => self.parse_array(column_type),
            "Nullable" => self.parse_nullable(column_type),
            "LowCardinality" => self.parse_low_cardinality(column_type),
            "Map" => self.parse_map(column_type),
            "Tuple" => self.parse_tuple(column_type),
            "Enum8" | "Enum16" => self.parse_enum(column_type),
            "Decimal" | "Decimal32" | "Decimal64" | "Decimal128" | "Decimal256" => {
                self.parse_decimal(column_type)
            }
            "FixedString" => self.parse_fixed_string(column_type),
            "DateTime" => self.parse_date_time(column_type),
            "DateTime64" => self.parse_date_time64(column_type),
            _ if family.len() != column_type.len() => {
                Err(self.error("Unsupported column type", column_type))
            }
            name if is_identifier(name) => Ok(node(
                TypeKind::Simple { name: name.to_owned() },
                column_type,
            )),
            _ => Err(self.error("Invalid column type", column_type)),
        }
    }

    fn parse_array(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        const MIN_LEN: usize = "Array(Int8)".len();

        let mut dimensions = 0;
        let mut current = column_type;
        loop {
            let inner = match unwrap_args(current, "Array") {
                Some(inner) if current.len() >= MIN_LEN => inner,
                _ => return Err(self.error("Invalid Array type", column_type)),
            };
            dimensions += 1;
            if inner.starts_with("Array(") || inner == "Array" {
                current = inner;
                continue;
            }
            let inner = self.parse(inner)?;
            return Ok(node(
                TypeKind::Array { inner: Box::new(inner), dimensions },
                column_type,
            ));
        }
    }

    fn parse_nullable(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let inner = match unwrap_args(column_type, "Nullable") {
            Some(inner) if !inner.is_empty() && !inner.starts_with("Nullable(") => inner,
            _ => return Err(self.error("Invalid Nullable type", column_type)),
        };
        let inner = self.parse(inner)?;
        Ok(node(TypeKind::Nullable { inner: Box::new(inner) }, column_type))
    }

    fn parse_low_cardinality(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let inner = match unwrap_args(column_type, "LowCardinality") {
            Some(inner) if !inner.is_empty() => inner,
            _ => return Err(self.error("Invalid LowCardinality type", column_type)),
        };
        let inner = self.parse(inner)?;
        Ok(node(TypeKind::LowCardinality { inner: Box::new(inner) }, column_type))
    }

    fn parse_map(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let args = unwrap_args(column_type, "Map").and_then(split_args);
        let [key, value] = match args.as_deref() {
            Some(&[key, value]) if !key.is_empty() && !value.is_empty() => [key, value],
            _ => return Err(self.error("Invalid Map type", column_type)),
        };
        Ok(node(
            TypeKind::Map {
                key: Box::new(self.parse(key)?),
                value: Box::new(self.parse(value)?),
            },
            column_type,
        ))
    }

    fn parse_tuple(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let args = match unwrap_args(column_type, "Tuple").and_then(split_args) {
            Some(args) if args.iter().all(|e| !e.is_empty()) => args,
            _ => return Err(self.error("Invalid Tuple type", column_type)),
        };

        let mut elements = Vec::with_capacity(args.len());
        for arg in args {
            let element = match arg.split_once(' ') {
                Some((name, ty)) if is_identifier(name) => TupleElement {
                    name: Some(name.to_owned()),
                    ty: self.parse(ty)?,
                },
                _ => TupleElement { name: None, ty: self.parse(arg)? },
            };
            elements.push(element);
        }

        Ok(node(TypeKind::Tuple { elements }, column_type))
    }

    fn parse_enum(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let (int_size, args) = match (
            unwrap_args(column_type, "Enum8"),
            unwrap_args(column_type, "Enum16"),
        ) {
            (Some(args), _) => (EnumSize::Enum8, args),
            (_, Some(args)) => (EnumSize::Enum16, args),
            _ => return Err(self.error("Invalid Enum type", column_type)),
        };

        let shape = || self.error("Invalid Enum type", column_type);
        let bytes = args.as_bytes();
        let skip_ws = |mut i: usize| {
            while bytes.get(i).is_some_and(u8::is_ascii_whitespace) {
                i += 1;
            }
            i
        };

        let mut values = BTreeMap::new();
        let mut i = 0;
        loop {
            // 'name'
            i = skip_ws(i);
            if bytes.get(i) != Some(&b'\'') {
                return Err(shape());
            }
            let start = i + 1;
            i = start;
            loop {
                match bytes.get(i) {
                    None => return Err(shape()),
                    Some(b'\\') => i += 2,
                    Some(b'\'') => break,
                    Some(_) => i += 1,
                }
            }
            let name = &args[start..i];
            i += 1;

            // =
            i = skip_ws(i);
            if bytes.get(i) != Some(&b'=') {
                return Err(shape());
            }
            i = skip_ws(i + 1);

            // index
            let num_start = i;
            while bytes.get(i).is_some_and(|b| b.is_ascii_digit() || *b == b'-') {
                i += 1;
            }
            let index = args[num_start..i]
                .parse::<i16>()
                .ok()
                .filter(|index| int_size == EnumSize::Enum16 || i8::try_from(*index).is_ok())
                .ok_or_else(|| {
                    self.error(format!("Invalid Enum index {:?}", &args[num_start..i]), column_type)
                })?;

            if values.contains_key(&index) {
                return Err(self.error(format!("Duplicate Enum index {index}"), column_type));
            }
            if values.values().any(|e: &String| e == name) {
                return Err(self.error(format!("Duplicate Enum name '{name}'"), column_type));
            }
            values.insert(index, name.to_owned());

            i = skip_ws(i);
            match bytes.get(i) {
                None => break,
                Some(b',') => i += 1,
                Some(_) => return Err(shape()),
            }
        }

        Ok(node(TypeKind::Enum { int_size, values }, column_type))
    }

    fn parse_decimal(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let shape = || self.error("Invalid Decimal type", column_type);

        let sized = [
            ("Decimal32", DecimalSize::Decimal32),
            ("Decimal64", DecimalSize::Decimal64),
            ("Decimal128", DecimalSize::Decimal128),
            ("Decimal256", DecimalSize::Decimal256),
        ];

        let (precision, scale) = match unwrap_args(column_type, "Decimal").and_then(split_args) {
            Some(args) => {
                let [precision, scale] = args[..] else {
                    return Err(shape());
                };
                let precision = parse_unsigned::<u8>(precision)
                    .filter(|p| DecimalSize::from_precision(*p).is_some())
                    .ok_or_else(|| self.error("Invalid Decimal precision", column_type))?;
                (precision, scale)
            }
            None => {
                let (args, size) = sized
                    .iter()
                    .find_map(|(name, size)| Some((unwrap_args(column_type, name)?, *size)))
                    .ok_or_else(shape)?;
                (size.max_precision(), args)
            }
        };

        let scale = parse_unsigned::<u8>(scale)
            .filter(|s| *s <= precision)
            .ok_or_else(|| self.error("Invalid Decimal scale", column_type))?;

        let int_size = DecimalSize::from_precision(precision).ok_or_else(shape)?;

        Ok(node(TypeKind::Decimal { precision, scale, int_size }, column_type))
    }

    fn parse_fixed_string(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let Some(size) = unwrap_args(column_type, "FixedString") else {
            return Err(self.error("Invalid FixedString type", column_type));
        };
        let size_bytes = parse_unsigned::<u32>(size)
            .filter(|n| *n > 0)
            .ok_or_else(|| self.error("Invalid FixedString size in bytes", column_type))?;
        Ok(node(TypeKind::FixedString { size_bytes }, column_type))
    }

    fn parse_date_time(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        if column_type == "DateTime" {
            return Ok(node(TypeKind::DateTime { timezone: None }, column_type));
        }
        let Some(timezone) = unwrap_args(column_type, "DateTime") else {
            return Err(self.error("Invalid DateTime type", column_type));
        };
        let timezone = parse_timezone(timezone)
            .ok_or_else(|| self.error("Invalid DateTime timezone", column_type))?;
        Ok(node(TypeKind::DateTime { timezone: Some(timezone) }, column_type))
    }

    fn parse_date_time64(&self, column_type: &str) -> Result<ColumnType, ParseTypeError> {
        let args = unwrap_args(column_type, "DateTime64").and_then(split_args);
        let (precision, timezone) = match args.as_deref() {
            Some(&[precision]) if !precision.is_empty() => (precision, None),
            Some(&[precision, timezone]) if !precision.is_empty() => (precision, Some(timezone)),
            _ => return Err(self.error("Invalid DateTime64 type", column_type)),
        };

        let precision = parse_unsigned::<u8>(precision)
            .filter(|p| *p <= 9)
            .ok_or_else(|| self.error("Invalid DateTime64 precision", column_type))?;

        let timezone = match timezone {
            Some(tz) => Some(
                parse_timezone(tz)
                    .ok_or_else(|| self.error("Invalid DateTime64 timezone", column_type))?,
            ),
            None => None,
        };

        Ok(node(TypeKind::DateTime64 { precision, timezone }, column_type))
    }
}

fn node(kind: TypeKind, source_type: &str) -> ColumnType {
    ColumnType { kind, source_type: source_type.to_owned() }
}

fn is_identifier(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_')
        && !name.as_bytes()[0].is_ascii_digit()
}

fn parse_unsigned<T: std::str::FromStr>(value: &str) -> Option<T> {
    let value = value.trim();
    match !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        true => value.parse().ok(),
        false => None,
    }
}

/// `'Europe/Amsterdam'` into `Europe/Amsterdam`, the name must be at least 2 chars.
fn parse_timezone(quoted: &str) -> Option<String> {
    let name = quoted.trim().strip_prefix('\'')?.strip_suffix('\'')?;
    (name.chars().count() >= 2 && !name.contains('\'')).then(|| name.to_owned())
}

/// Strip `Family(` and the matching trailing `)`.
///
/// Returns [`None`] if the declaration is not of the given family, or if the
/// trailing parenthesis does not close the opening one.
fn unwrap_args<'a>(column_type: &'a str, family: &str) -> Option<&'a str> {
    let args = column_type
        .strip_prefix(family)?
        .strip_prefix('(')?
        .strip_suffix(')')?;
    split_args(args)?;
    Some(args.trim())
}

/// Split arguments at top level commas.
///
/// Commas and parentheses inside nested declarations or quoted literals are
/// skipped. Returns [`None`] on unbalanced input.
fn split_args(args: &str) -> Option<Vec<&str>> {
    let mut out = vec![];
    let mut depth = 0usize;
    let mut quoted = false;
    let mut escaped = false;
    let mut start = 0;

    for (i, b) in args.bytes().enumerate() {
        if quoted {
            match (escaped, b) {
                (true, _) => escaped = false,
                (false, b'\\') => escaped = true,
                (false, b'\'') => quoted = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'\'' => quoted = true,
            b'(' => depth += 1,
            b')' => depth = depth.checked_sub(1)?,
            b',' if depth == 0 => {
                out.push(args[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }

    if quoted || depth != 0 {
        return None;
    }
    out.push(args[start..].trim());
    Some(out)
}

/// An error when parsing column type declaration.
pub struct ParseTypeError {
    reason: Cow<'static, str>,
    column_type: String,
    source_type: String,
}

impl ParseTypeError {
    pub(crate) fn unsupported(ty: &ColumnType) -> ParseTypeError {
        ParseTypeError {
            reason: "Unsupported column type".into(),
            column_type: ty.source_type.clone(),
            source_type: ty.source_type.clone(),
        }
    }

    /// Which type family and which aspect of it failed.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The declaration that failed, may be nested inside [`source_type`][Self::source_type].
    pub fn column_type(&self) -> &str {
        &self.column_type
    }

    /// The full declaration given to the parser.
    pub fn source_type(&self) -> &str {
        &self.source_type
    }
}

impl std::error::Error for ParseTypeError { }

impl fmt::Display for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.reason, self.column_type)?;
        if self.column_type != self.source_type {
            write!(f, " (in {})", self.source_type)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ParseTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}
