//! Named typed arrays and conversions to and from host buffers
//!
//! A [DataArray] is the unit of attribute data carried by every dataset. The
//! values are stored component-interleaved, so a 3-component array of `n`
//! tuples holds `3n` values as `x0 y0 z0 x1 y1 z1 ...`.

// standard library
use std::fmt;

// crate modules
use crate::error::{Error, Result};

// geokit modules
use geokit_utils::f;

// external crates
use ndarray::{Array2, ArrayBase, Data, Dimension};
use serde::{Deserialize, Serialize};

/// Scalar type of the values held by an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarKind {
    /// 32-bit signed integers
    Int32,
    /// 64-bit signed integers
    Int64,
    /// 32-bit floats
    Float32,
    /// 64-bit floats
    Float64,
    /// Strings, one per value
    Str,
}

/// Typed storage behind a [DataArray]
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayData {
    /// 32-bit signed integers
    Int32(Vec<i32>),
    /// 64-bit signed integers
    Int64(Vec<i64>),
    /// 32-bit floats
    Float32(Vec<f32>),
    /// 64-bit floats
    Float64(Vec<f64>),
    /// Strings, one per value
    Str(Vec<String>),
}

impl ArrayData {
    /// The scalar type of the storage
    pub fn kind(&self) -> ScalarKind {
        match self {
            Self::Int32(_) => ScalarKind::Int32,
            Self::Int64(_) => ScalarKind::Int64,
            Self::Float32(_) => ScalarKind::Float32,
            Self::Float64(_) => ScalarKind::Float64,
            Self::Str(_) => ScalarKind::Str,
        }
    }

    /// Total number of values, ignoring components
    pub fn len(&self) -> usize {
        match self {
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float32(v) => v.len(),
            Self::Float64(v) => v.len(),
            Self::Str(v) => v.len(),
        }
    }

    /// True when there are no values
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric values widened to `f64`
    ///
    /// String arrays have no numeric representation and fail with
    /// [Error::InvalidArgument].
    pub fn to_f64(&self) -> Result<Vec<f64>> {
        Ok(match self {
            Self::Int32(v) => v.iter().map(|x| *x as f64).collect(),
            Self::Int64(v) => v.iter().map(|x| *x as f64).collect(),
            Self::Float32(v) => v.iter().map(|x| *x as f64).collect(),
            Self::Float64(v) => v.clone(),
            Self::Str(_) => {
                return Err(Error::InvalidArgument(
                    "string arrays can not be converted to numeric values".into(),
                ))
            }
        })
    }

    /// Convert the storage to another scalar kind
    ///
    /// Numeric casts follow `as` semantics. Strings are parsed when cast to
    /// a numeric kind and any failure is a [Error::ParseError].
    pub fn cast(&self, kind: ScalarKind) -> Result<ArrayData> {
        if self.kind() == kind {
            return Ok(self.clone());
        }

        if let Self::Str(values) = self {
            return Self::parse_strings(values, kind);
        }

        let values = self.to_f64()?;
        Ok(match kind {
            ScalarKind::Int32 => Self::Int32(values.iter().map(|v| *v as i32).collect()),
            ScalarKind::Int64 => Self::Int64(values.iter().map(|v| *v as i64).collect()),
            ScalarKind::Float32 => Self::Float32(values.iter().map(|v| *v as f32).collect()),
            ScalarKind::Float64 => Self::Float64(values),
            ScalarKind::Str => Self::Str(self.to_strings()),
        })
    }

    /// Every value formatted with its `Display` implementation
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Self::Int32(v) => v.iter().map(|x| x.to_string()).collect(),
            Self::Int64(v) => v.iter().map(|x| x.to_string()).collect(),
            Self::Float32(v) => v.iter().map(|x| x.to_string()).collect(),
            Self::Float64(v) => v.iter().map(|x| x.to_string()).collect(),
            Self::Str(v) => v.clone(),
        }
    }

    /// New storage of the same kind holding the values at `indices`
    pub fn take(&self, indices: &[usize]) -> ArrayData {
        fn pick<T: Clone>(v: &[T], indices: &[usize]) -> Vec<T> {
            indices.iter().map(|i| v[*i].clone()).collect()
        }

        match self {
            Self::Int32(v) => Self::Int32(pick(v, indices)),
            Self::Int64(v) => Self::Int64(pick(v, indices)),
            Self::Float32(v) => Self::Float32(pick(v, indices)),
            Self::Float64(v) => Self::Float64(pick(v, indices)),
            Self::Str(v) => Self::Str(pick(v, indices)),
        }
    }

    fn parse_strings(values: &[String], kind: ScalarKind) -> Result<ArrayData> {
        fn parse_all<T: std::str::FromStr>(values: &[String]) -> Result<Vec<T>> {
            values
                .iter()
                .map(|s| {
                    s.trim()
                        .parse::<T>()
                        .map_err(|_| Error::ParseError(f!("unable to parse \"{s}\" as a number")))
                })
                .collect()
        }

        Ok(match kind {
            ScalarKind::Int32 => Self::Int32(parse_all(values)?),
            ScalarKind::Int64 => Self::Int64(parse_all(values)?),
            ScalarKind::Float32 => Self::Float32(parse_all(values)?),
            ScalarKind::Float64 => Self::Float64(parse_all(values)?),
            ScalarKind::Str => Self::Str(values.to_vec()),
        })
    }
}

impl From<Vec<i32>> for ArrayData {
    fn from(v: Vec<i32>) -> Self {
        Self::Int32(v)
    }
}

impl From<Vec<i64>> for ArrayData {
    fn from(v: Vec<i64>) -> Self {
        Self::Int64(v)
    }
}

impl From<Vec<f32>> for ArrayData {
    fn from(v: Vec<f32>) -> Self {
        Self::Float32(v)
    }
}

impl From<Vec<f64>> for ArrayData {
    fn from(v: Vec<f64>) -> Self {
        Self::Float64(v)
    }
}

impl From<Vec<String>> for ArrayData {
    fn from(v: Vec<String>) -> Self {
        Self::Str(v)
    }
}

/// A named, typed, component-interleaved attribute array
///
/// ```rust
/// # use geokit_core::{ArrayData, DataArray};
/// let centers = DataArray::with_components(
///     "Cell Centers",
///     3,
///     vec![0.5, 0.5, 0.5, 1.5, 0.5, 0.5],
/// ).unwrap();
///
/// assert_eq!(centers.number_of_tuples(), 2);
/// assert_eq!(centers.tuple(1).unwrap(), vec![1.5, 0.5, 0.5]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataArray {
    /// Human readable name, unique within an association
    pub name: String,
    /// Number of components per tuple, at least 1
    pub components: usize,
    /// The values
    pub data: ArrayData,
}

impl DataArray {
    /// A single component array
    pub fn new(name: impl Into<String>, data: impl Into<ArrayData>) -> Self {
        Self {
            name: name.into(),
            components: 1,
            data: data.into(),
        }
    }

    /// An array with `components` values per tuple
    ///
    /// Fails if the number of values is not a multiple of the components.
    pub fn with_components(
        name: impl Into<String>,
        components: usize,
        data: impl Into<ArrayData>,
    ) -> Result<Self> {
        let data = data.into();
        if components == 0 || data.len() % components != 0 {
            return Err(Error::size_mismatch(
                "array length is not a multiple of its components",
                components.max(1) * (data.len() / components.max(1) + 1),
                data.len(),
            ));
        }
        Ok(Self {
            name: name.into(),
            components,
            data,
        })
    }

    /// Number of tuples, i.e. the length in terms of points/cells/rows
    pub fn number_of_tuples(&self) -> usize {
        self.data.len() / self.components.max(1)
    }

    /// Total number of values
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when there are no values
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Scalar type of the values
    pub fn kind(&self) -> ScalarKind {
        self.data.kind()
    }

    /// Values widened to `f64`
    pub fn values(&self) -> Result<Vec<f64>> {
        self.data.to_f64()
    }

    /// Components of a single tuple widened to `f64`
    pub fn tuple(&self, index: usize) -> Result<Vec<f64>> {
        if index >= self.number_of_tuples() {
            return Err(Error::InvalidArgument(f!(
                "tuple {index} is out of range for array \"{}\" of {} tuples",
                self.name,
                self.number_of_tuples()
            )));
        }
        let start = index * self.components;
        let indices = (start..start + self.components).collect::<Vec<usize>>();
        self.data.take(&indices).to_f64()
    }

    /// A copy holding only the tuples at `indices`, in that order
    pub fn take_tuples(&self, indices: &[usize]) -> DataArray {
        let value_indices = indices
            .iter()
            .flat_map(|t| (t * self.components)..(t * self.components + self.components))
            .collect::<Vec<usize>>();

        DataArray {
            name: self.name.clone(),
            components: self.components,
            data: self.data.take(&value_indices),
        }
    }

    /// The same array under a different name
    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Field association of an array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Association {
    /// Per-point attributes
    Point,
    /// Per-cell attributes
    Cell,
    /// Free metadata arrays of arbitrary length
    Field,
    /// Table columns
    Row,
}

impl Association {
    /// Order in which associations are searched by name
    pub const SEARCH_ORDER: [Association; 4] = [Self::Point, Self::Cell, Self::Field, Self::Row];
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Point => "POINT_DATA",
            Self::Cell => "CELL_DATA",
            Self::Field => "FIELD_DATA",
            Self::Row => "ROW_DATA",
        };
        write!(f, "{s}")
    }
}

/// Element types that map directly onto [ArrayData] storage
pub trait HostElement: Clone {
    /// Wrap a vector of values in the matching storage variant
    fn into_array_data(values: Vec<Self>) -> ArrayData;
}

impl HostElement for i32 {
    fn into_array_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Int32(values)
    }
}

impl HostElement for i64 {
    fn into_array_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Int64(values)
    }
}

impl HostElement for f32 {
    fn into_array_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Float32(values)
    }
}

impl HostElement for f64 {
    fn into_array_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Float64(values)
    }
}

impl HostElement for String {
    fn into_array_data(values: Vec<Self>) -> ArrayData {
        ArrayData::Str(values)
    }
}

/// Convert a host buffer into a named dataset array
///
/// One dimensional buffers become single component arrays, and for two
/// dimensional buffers the second axis is the number of components. Values are
/// taken in logical (row-major) order.
///
/// A shallow conversion (`deep = false`) can only alias a buffer that is
/// already contiguous in standard layout, so anything else is rejected with
/// [Error::InvalidArgument]. The optional `array_type` casts the values on the
/// way through.
///
/// ```rust
/// # use geokit_core::{to_dataset_array, ScalarKind};
/// # use ndarray::array;
/// let points = array![[0.0, 0.0, 0.0], [1.0, 2.0, 3.0]];
/// let arr = to_dataset_array(&points, "Points", true, None).unwrap();
/// assert_eq!(arr.components, 3);
///
/// // transposed views are not contiguous
/// assert!(to_dataset_array(&points.t(), "Points", false, None).is_err());
///
/// // cast on the way through
/// let arr = to_dataset_array(&points, "Points", true, Some(ScalarKind::Int32)).unwrap();
/// assert_eq!(arr.kind(), ScalarKind::Int32);
/// ```
pub fn to_dataset_array<S, D>(
    buffer: &ArrayBase<S, D>,
    name: &str,
    deep: bool,
    array_type: Option<ScalarKind>,
) -> Result<DataArray>
where
    S: Data,
    S::Elem: HostElement,
    D: Dimension,
{
    if !deep && !buffer.is_standard_layout() {
        return Err(Error::InvalidArgument(f!(
            "buffer for \"{name}\" is not contiguous and can not be aliased"
        )));
    }

    let components = match buffer.ndim() {
        0 | 1 => 1,
        2 => buffer.shape()[1].max(1),
        n => {
            return Err(Error::InvalidArgument(f!(
                "buffer for \"{name}\" has {n} dimensions, expected 1 or 2"
            )))
        }
    };

    let values = buffer.iter().cloned().collect::<Vec<S::Elem>>();
    let mut data = S::Elem::into_array_data(values);
    if let Some(kind) = array_type {
        data = data.cast(kind)?;
    }

    DataArray::with_components(name, components, data)
}

/// Convert a dataset array into a contiguous `(tuples, components)` buffer
///
/// ```rust
/// # use geokit_core::{to_host_array, DataArray};
/// let arr = DataArray::with_components("v", 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
/// let host = to_host_array(&arr).unwrap();
/// assert_eq!(host.shape(), &[2, 2]);
/// assert_eq!(host[[1, 0]], 3.0);
/// ```
pub fn to_host_array(array: &DataArray) -> Result<Array2<f64>> {
    let values = array.values()?;
    Ok(Array2::from_shape_vec(
        (array.number_of_tuples(), array.components.max(1)),
        values,
    )?)
}

/// Convert a set of single component arrays into a (names, columns) pair
///
/// This is the dataframe-like view of a table. Arrays with more than one
/// component contribute one column per component named `name[i]`.
pub fn to_dataframe(arrays: &[DataArray]) -> Result<(Vec<String>, Array2<f64>)> {
    let rows = arrays.first().map(|a| a.number_of_tuples()).unwrap_or(0);
    let mut names = Vec::new();
    let mut columns = Vec::new();

    for array in arrays {
        if array.number_of_tuples() != rows {
            return Err(Error::size_mismatch(
                f!("column \"{}\" has the wrong number of rows", array.name),
                rows,
                array.number_of_tuples(),
            ));
        }
        let host = to_host_array(array)?;
        for c in 0..array.components {
            names.push(match array.components {
                1 => array.name.clone(),
                _ => f!("{}[{c}]", array.name),
            });
            columns.extend(host.column(c).iter().copied());
        }
    }

    // columns were stacked column-major
    let frame = Array2::from_shape_vec((names.len(), rows), columns)?
        .reversed_axes()
        .as_standard_layout()
        .to_owned();
    Ok((names, frame))
}

/// Terse data type codes used by packed binary files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// 'd' - 64-bit float
    Double,
    /// 'f' - 32-bit float
    Float,
    /// 'i' - 32-bit signed integer
    Int,
}

impl DataType {
    /// Parse the terse character code
    pub fn from_code(code: char) -> Result<Self> {
        match code {
            'd' => Ok(Self::Double),
            'f' => Ok(Self::Float),
            'i' => Ok(Self::Int),
            _ => Err(Error::InvalidArgument(f!(
                "data type \"{code}\" is not one of 'd', 'f', or 'i'"
            ))),
        }
    }

    /// The terse character code
    pub fn code(&self) -> char {
        match self {
            Self::Double => 'd',
            Self::Float => 'f',
            Self::Int => 'i',
        }
    }

    /// Size in bytes of a single value on disk
    pub fn size(&self) -> usize {
        match self {
            Self::Double => 8,
            Self::Float | Self::Int => 4,
        }
    }

    /// Kind of the in-memory array produced when decoding
    pub fn scalar_kind(&self) -> ScalarKind {
        match self {
            Self::Double => ScalarKind::Float64,
            Self::Float => ScalarKind::Float32,
            Self::Int => ScalarKind::Int32,
        }
    }
}

impl Default for DataType {
    fn default() -> Self {
        Self::Float
    }
}

/// Byte order of packed binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endian {
    /// Whatever the host uses
    Native,
    /// '<'
    Little,
    /// '>'
    Big,
}

impl Endian {
    /// Parse the terse character code, where '', '@' and '=' mean native
    pub fn from_code(code: &str) -> Result<Self> {
        match code {
            "" | "@" | "=" => Ok(Self::Native),
            "<" => Ok(Self::Little),
            ">" => Ok(Self::Big),
            _ => Err(Error::InvalidArgument(f!(
                "endianness \"{code}\" is not one of '<', '>', or ''"
            ))),
        }
    }

    /// Normalise native ordering away
    pub fn resolve(&self) -> Self {
        match self {
            Self::Native if cfg!(target_endian = "big") => Self::Big,
            Self::Native => Self::Little,
            other => *other,
        }
    }
}

impl Default for Endian {
    fn default() -> Self {
        Self::Native
    }
}

/// Decode a packed stream of values into host-native storage
///
/// Trailing bytes that do not make up a whole value are an error.
///
/// ```rust
/// # use geokit_core::{decode_packed, ArrayData, DataType, Endian};
/// let bytes = [1.5f32.to_be_bytes(), (-2.0f32).to_be_bytes()].concat();
/// let data = decode_packed(&bytes, DataType::Float, Endian::Big).unwrap();
/// assert_eq!(data, ArrayData::Float32(vec![1.5, -2.0]));
/// ```
pub fn decode_packed(bytes: &[u8], dtype: DataType, endian: Endian) -> Result<ArrayData> {
    let size = dtype.size();
    if bytes.len() % size != 0 {
        return Err(Error::size_mismatch(
            "packed binary stream does not hold a whole number of values",
            (bytes.len() / size + 1) * size,
            bytes.len(),
        ));
    }

    let big = endian.resolve() == Endian::Big;
    let chunks = bytes.chunks_exact(size);

    // chunks_exact guarantees the slice lengths so the conversions are infallible
    Ok(match dtype {
        DataType::Double => ArrayData::Float64(
            chunks
                .map(|c| {
                    let mut b = [0u8; 8];
                    b.copy_from_slice(c);
                    match big {
                        true => f64::from_be_bytes(b),
                        false => f64::from_le_bytes(b),
                    }
                })
                .collect(),
        ),
        DataType::Float => ArrayData::Float32(
            chunks
                .map(|c| {
                    let mut b = [0u8; 4];
                    b.copy_from_slice(c);
                    match big {
                        true => f32::from_be_bytes(b),
                        false => f32::from_le_bytes(b),
                    }
                })
                .collect(),
        ),
        DataType::Int => ArrayData::Int32(
            chunks
                .map(|c| {
                    let mut b = [0u8; 4];
                    b.copy_from_slice(c);
                    match big {
                        true => i32::from_be_bytes(b),
                        false => i32::from_le_bytes(b),
                    }
                })
                .collect(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn decode_little_and_native() {
        let bytes = [7i32.to_le_bytes(), (-3i32).to_le_bytes()].concat();
        let data = decode_packed(&bytes, DataType::Int, Endian::Little).unwrap();
        assert_eq!(data, ArrayData::Int32(vec![7, -3]));

        let bytes = 2.25f64.to_ne_bytes();
        let data = decode_packed(&bytes, DataType::Double, Endian::Native).unwrap();
        assert_eq!(data, ArrayData::Float64(vec![2.25]));
    }

    #[test]
    fn decode_rejects_partial_values() {
        let bytes = [0u8; 6];
        assert!(matches!(
            decode_packed(&bytes, DataType::Float, Endian::Little),
            Err(Error::SizeMismatch { .. })
        ));
    }

    #[test]
    fn codes_round_trip() {
        for code in ['d', 'f', 'i'] {
            assert_eq!(DataType::from_code(code).unwrap().code(), code);
        }
        assert!(DataType::from_code('q').is_err());
        assert_eq!(Endian::from_code("").unwrap(), Endian::Native);
        assert_eq!(Endian::from_code(">").unwrap(), Endian::Big);
        assert!(Endian::from_code("!").is_err());
    }

    #[test]
    fn string_cast_parses_or_fails() {
        let data = ArrayData::Str(vec!["1".into(), " 2 ".into()]);
        assert_eq!(
            data.cast(ScalarKind::Int32).unwrap(),
            ArrayData::Int32(vec![1, 2])
        );
        let bad = ArrayData::Str(vec!["x".into()]);
        assert!(matches!(
            bad.cast(ScalarKind::Float64),
            Err(Error::ParseError(_))
        ));
        assert!(bad.to_f64().is_err());
    }

    #[test]
    fn take_tuples_respects_components() {
        let arr = DataArray::with_components("v", 2, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        let picked = arr.take_tuples(&[2, 0]);
        assert_eq!(picked.data, ArrayData::Float64(vec![4.0, 5.0, 0.0, 1.0]));
    }

    #[test]
    fn invalid_components() {
        assert!(DataArray::with_components("v", 2, vec![0.0, 1.0, 2.0]).is_err());
        assert!(DataArray::with_components("v", 0, vec![0.0]).is_err());
    }

    #[test]
    fn dataframe_columns() {
        let a = DataArray::new("a", vec![1.0, 2.0]);
        let b = DataArray::new("b", vec![3i32, 4]);
        let (names, frame) = to_dataframe(&[a, b]).unwrap();
        assert_eq!(names, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(frame, array![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn string_buffers_convert() {
        let names = array!["a".to_string(), "b".to_string()];
        let arr = to_dataset_array(&names, "names", true, None).unwrap();
        assert_eq!(arr.kind(), ScalarKind::Str);
        assert!(to_host_array(&arr).is_err());
    }
}
