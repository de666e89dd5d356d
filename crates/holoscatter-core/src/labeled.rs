//! Labeled multi-dimensional arrays.
//!
//! [`LabeledArray`] is a small n-dimensional array with named dimensions,
//! coordinate columns, and optional schema metadata. It is the currency of
//! this crate: detector geometries, scattered fields, scattering matrices and
//! cross sections are all labeled arrays, so coordinate information survives
//! every step from the detector description to the packed result.

use std::ops::Add;

use ndarray::{Array1, ArrayD, ArrayViewD, Axis, IxDyn, Zip};

use crate::error::ScatteringError;
use crate::schema::Metadata;

/// Dimension holding Cartesian field components.
pub const VECTOR: &str = "vector";
/// Dimension holding illumination colors.
pub const ILLUMINATION: &str = "illumination";
/// Dimension of a flattened detector grid.
pub const FLAT: &str = "flat";
/// Dimension of a detector point list.
pub const POINT: &str = "point";

/// Values of one coordinate.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordValues {
    Float(Array1<f64>),
    Label(Vec<String>),
}

impl CoordValues {
    pub fn len(&self) -> usize {
        match self {
            CoordValues::Float(v) => v.len(),
            CoordValues::Label(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_float(&self) -> Option<&Array1<f64>> {
        match self {
            CoordValues::Float(v) => Some(v),
            CoordValues::Label(_) => None,
        }
    }

    pub fn as_labels(&self) -> Option<&[String]> {
        match self {
            CoordValues::Label(v) => Some(v),
            CoordValues::Float(_) => None,
        }
    }

    /// Gather values by position.
    fn take(&self, indices: impl Iterator<Item = usize>) -> CoordValues {
        match self {
            CoordValues::Float(v) => CoordValues::Float(indices.map(|i| v[i]).collect()),
            CoordValues::Label(v) => CoordValues::Label(indices.map(|i| v[i].clone()).collect()),
        }
    }
}

impl From<Vec<f64>> for CoordValues {
    fn from(v: Vec<f64>) -> Self {
        CoordValues::Float(Array1::from(v))
    }
}

impl From<Array1<f64>> for CoordValues {
    fn from(v: Array1<f64>) -> Self {
        CoordValues::Float(v)
    }
}

impl From<Vec<String>> for CoordValues {
    fn from(v: Vec<String>) -> Self {
        CoordValues::Label(v)
    }
}

impl From<&[&str]> for CoordValues {
    fn from(v: &[&str]) -> Self {
        CoordValues::Label(v.iter().map(|s| s.to_string()).collect())
    }
}

/// A coordinate: values laid along one dimension, or a single scalar value.
#[derive(Debug, Clone, PartialEq)]
pub struct Coordinate {
    /// Dimension the values run along; `None` for a scalar coordinate.
    pub dim: Option<String>,
    pub values: CoordValues,
}

impl Coordinate {
    pub fn along(dim: &str, values: impl Into<CoordValues>) -> Self {
        Self {
            dim: Some(dim.to_string()),
            values: values.into(),
        }
    }

    pub fn scalar(value: f64) -> Self {
        Self {
            dim: None,
            values: CoordValues::from(vec![value]),
        }
    }
}

/// An n-dimensional array with named dimensions and coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledArray<T> {
    values: ArrayD<T>,
    dims: Vec<String>,
    coords: Vec<(String, Coordinate)>,
    attrs: Option<Metadata>,
}

impl<T> LabeledArray<T> {
    pub fn new(values: ArrayD<T>, dims: &[&str]) -> Result<Self, ScatteringError> {
        Self::from_parts(values, dims.iter().map(|d| d.to_string()).collect())
    }

    fn from_parts(values: ArrayD<T>, dims: Vec<String>) -> Result<Self, ScatteringError> {
        if values.ndim() != dims.len() {
            return Err(ScatteringError::ShapeMismatch(format!(
                "{} dimension names for an array of rank {}",
                dims.len(),
                values.ndim()
            )));
        }
        for (i, d) in dims.iter().enumerate() {
            if dims[..i].contains(d) {
                return Err(ScatteringError::ShapeMismatch(format!(
                    "duplicate dimension '{d}'"
                )));
            }
        }
        Ok(Self {
            values,
            dims,
            coords: Vec::new(),
            attrs: None,
        })
    }

    /// Attach (or replace) a coordinate, checking its length.
    pub fn with_coord(mut self, name: &str, coord: Coordinate) -> Result<Self, ScatteringError> {
        let expected = match &coord.dim {
            Some(d) => self.dim_len(d).ok_or_else(|| {
                ScatteringError::ShapeMismatch(format!(
                    "coordinate '{name}' refers to unknown dimension '{d}'"
                ))
            })?,
            None => 1,
        };
        if coord.values.len() != expected {
            return Err(ScatteringError::ShapeMismatch(format!(
                "coordinate '{name}' has {} values, expected {expected}",
                coord.values.len()
            )));
        }
        self.coords.retain(|(n, _)| n != name);
        self.coords.push((name.to_string(), coord));
        Ok(self)
    }

    pub fn with_attrs(mut self, attrs: Metadata) -> Self {
        self.attrs = Some(attrs);
        self
    }

    pub fn values(&self) -> &ArrayD<T> {
        &self.values
    }

    pub fn into_values(self) -> ArrayD<T> {
        self.values
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn shape(&self) -> &[usize] {
        self.values.shape()
    }

    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn dim_len(&self, dim: &str) -> Option<usize> {
        self.axis(dim).map(|a| self.values.shape()[a])
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis(dim).is_some()
    }

    pub fn coord(&self, name: &str) -> Option<&Coordinate> {
        self.coords.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    pub fn coords(&self) -> impl Iterator<Item = (&str, &Coordinate)> {
        self.coords.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn has_coord(&self, name: &str) -> bool {
        self.coord(name).is_some()
    }

    /// Numeric values of a coordinate.
    pub fn float_coord(&self, name: &str) -> Option<&Array1<f64>> {
        self.coord(name).and_then(|c| c.values.as_float())
    }

    pub fn attrs(&self) -> Option<&Metadata> {
        self.attrs.as_ref()
    }

    /// Apply `f` to every element, keeping labels and metadata.
    pub fn map<U>(&self, f: impl Fn(&T) -> U) -> LabeledArray<U> {
        LabeledArray {
            values: self.values.map(f),
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        }
    }

    /// Coordinates that survive the removal of `dim`.
    fn coords_without(&self, dim: &str) -> Vec<(String, Coordinate)> {
        self.coords
            .iter()
            .filter(|(_, c)| c.dim.as_deref() != Some(dim))
            .cloned()
            .collect()
    }
}

impl<T: Clone> LabeledArray<T> {
    /// Collapse every dimension into a single dimension `new_dim`.
    ///
    /// Elements are taken in row-major order (first dimension outermost), and
    /// every coordinate, scalar ones included, becomes a column along
    /// `new_dim` with one value per element.
    pub fn stacked(&self, new_dim: &str) -> LabeledArray<T> {
        let shape = self.values.shape().to_vec();
        let total: usize = shape.iter().product();
        let values = Array1::from(self.values.iter().cloned().collect::<Vec<_>>()).into_dyn();

        let mut strides = vec![1usize; shape.len()];
        for a in (0..shape.len().saturating_sub(1)).rev() {
            strides[a] = strides[a + 1] * shape[a + 1];
        }

        let coords = self
            .coords
            .iter()
            .map(|(name, c)| {
                let column = match c.dim.as_deref().and_then(|d| self.axis(d)) {
                    Some(a) => c.values.take((0..total).map(|i| (i / strides[a]) % shape[a])),
                    None => c.values.take(std::iter::repeat(0).take(total)),
                };
                (name.clone(), Coordinate::along(new_dim, column))
            })
            .collect();

        LabeledArray {
            values,
            dims: vec![new_dim.to_string()],
            coords,
            attrs: self.attrs.clone(),
        }
    }

    /// Lay every scalar coordinate along `dim`, repeated once per element.
    ///
    /// Coordinates already laid along a dimension are left alone. Arrays
    /// without `dim` come back unchanged.
    pub fn with_scalars_along(&self, dim: &str) -> LabeledArray<T> {
        let mut out = self.clone();
        let Some(n) = self.dim_len(dim) else {
            return out;
        };
        for (_, c) in out.coords.iter_mut().filter(|(_, c)| c.dim.is_none()) {
            *c = Coordinate::along(dim, c.values.take(std::iter::repeat(0).take(n)));
        }
        out
    }

    /// Expand dimension `dim` back into the dimensions of `template`.
    ///
    /// Inverse of [`stacked`](Self::stacked): the template's dimensions take the
    /// place of `dim`, its coordinates replace every coordinate laid along
    /// `dim`, and all other dimensions are left alone.
    pub fn unstacked<U>(
        &self,
        dim: &str,
        template: &LabeledArray<U>,
    ) -> Result<LabeledArray<T>, ScatteringError> {
        let a = self.axis(dim).ok_or_else(|| {
            ScatteringError::ShapeMismatch(format!("no dimension '{dim}' to unstack"))
        })?;
        let n = self.values.shape()[a];
        let template_len: usize = template.shape().iter().product();
        if n != template_len {
            return Err(ScatteringError::ShapeMismatch(format!(
                "cannot unstack {n} elements into a template of {template_len}"
            )));
        }

        let mut shape = self.values.shape().to_vec();
        shape.splice(a..=a, template.shape().iter().copied());
        let mut dims = self.dims.clone();
        dims.splice(a..=a, template.dims.iter().cloned());

        let values = self
            .values
            .as_standard_layout()
            .into_owned()
            .into_shape(IxDyn(&shape))?;

        let mut unstacked = LabeledArray::from_parts(values, dims)?;
        unstacked.coords = self.coords_without(dim);
        unstacked.coords.extend(template.coords.iter().cloned());
        unstacked.attrs = self.attrs.clone();
        Ok(unstacked)
    }

    /// Stack equally-shaped arrays along a new leading dimension `dim`.
    ///
    /// Coordinates come from the first array; `labels` become the coordinate
    /// of the new dimension.
    pub fn concat(
        arrays: &[LabeledArray<T>],
        dim: &str,
        labels: Vec<String>,
    ) -> Result<LabeledArray<T>, ScatteringError> {
        let first = arrays.first().ok_or_else(|| {
            ScatteringError::ShapeMismatch("cannot concatenate zero arrays".into())
        })?;
        if labels.len() != arrays.len() {
            return Err(ScatteringError::ShapeMismatch(format!(
                "{} labels for {} arrays",
                labels.len(),
                arrays.len()
            )));
        }
        if arrays.iter().any(|a| a.dims != first.dims) {
            return Err(ScatteringError::ShapeMismatch(
                "cannot concatenate arrays with different dimensions".into(),
            ));
        }

        let views: Vec<ArrayViewD<'_, T>> = arrays.iter().map(|a| a.values.view()).collect();
        let values = ndarray::stack(Axis(0), &views)?;

        let mut dims = vec![dim.to_string()];
        dims.extend(first.dims.iter().cloned());

        let stacked = LabeledArray {
            values,
            dims,
            coords: first.coords.clone(),
            attrs: first.attrs.clone(),
        };
        stacked.with_coord(dim, Coordinate::along(dim, labels))
    }

    /// The sub-array at `label` along `dim`.
    pub fn select(&self, dim: &str, label: &str) -> Result<LabeledArray<T>, ScatteringError> {
        let a = self.axis(dim).ok_or_else(|| {
            ScatteringError::ShapeMismatch(format!("no dimension '{dim}'"))
        })?;
        let index = self
            .coords
            .iter()
            .find(|(_, c)| c.dim.as_deref() == Some(dim))
            .and_then(|(_, c)| c.values.as_labels())
            .and_then(|labels| labels.iter().position(|l| l == label))
            .ok_or_else(|| {
                ScatteringError::ShapeMismatch(format!("no label '{label}' along '{dim}'"))
            })?;

        let mut dims = self.dims.clone();
        dims.remove(a);
        let mut selected =
            LabeledArray::from_parts(self.values.index_axis(Axis(a), index).to_owned(), dims)?;
        selected.coords = self.coords_without(dim);
        selected.attrs = self.attrs.clone();
        Ok(selected)
    }

    /// Combine with `other`, broadcasting `other` across this array's dims.
    ///
    /// Every dimension of `other` must also be a dimension of `self` with the
    /// same length; dimensions are matched by name, not position.
    pub fn zip_with<U, V>(
        &self,
        other: &LabeledArray<U>,
        f: impl Fn(&T, &U) -> V,
    ) -> Result<LabeledArray<V>, ScatteringError> {
        let mut order = Vec::with_capacity(other.dims.len());
        for d in &other.dims {
            let a = self.axis(d).ok_or_else(|| {
                ScatteringError::ShapeMismatch(format!(
                    "dimension '{d}' is not present in the target array"
                ))
            })?;
            order.push(a);
        }
        // Put other's axes into the order they appear in self.
        let mut permutation: Vec<usize> = (0..order.len()).collect();
        permutation.sort_by_key(|&i| order[i]);

        let mut aligned = other.values.view().permuted_axes(permutation);
        for (a, d) in self.dims.iter().enumerate() {
            if !other.has_dim(d) {
                aligned = aligned.insert_axis(Axis(a));
            }
        }
        let broadcast = aligned.broadcast(self.values.raw_dim()).ok_or_else(|| {
            ScatteringError::ShapeMismatch(format!(
                "cannot broadcast {:?} onto {:?}",
                other.shape(),
                self.shape()
            ))
        })?;

        let values = Zip::from(&self.values)
            .and(&broadcast)
            .map_collect(|a, b| f(a, b));

        Ok(LabeledArray {
            values,
            dims: self.dims.clone(),
            coords: self.coords.clone(),
            attrs: self.attrs.clone(),
        })
    }
}

impl<T: Clone + Add<Output = T>> LabeledArray<T> {
    /// Elementwise sum with an identically-shaped array.
    pub fn superposed(mut self, other: &LabeledArray<T>) -> Result<Self, ScatteringError> {
        if self.dims != other.dims || self.shape() != other.shape() {
            return Err(ScatteringError::ShapeMismatch(format!(
                "cannot add {:?} {:?} to {:?} {:?}",
                other.dims,
                other.shape(),
                self.dims,
                self.shape()
            )));
        }
        self.values
            .zip_mut_with(&other.values, |a, b| *a = a.clone() + b.clone());
        Ok(self)
    }
}

impl<T: Clone + Default + Add<Output = T>> LabeledArray<T> {
    /// Sum over `dim`, dropping it and its coordinates.
    pub fn sum_over(&self, dim: &str) -> Result<LabeledArray<T>, ScatteringError> {
        let a = self.axis(dim).ok_or_else(|| {
            ScatteringError::ShapeMismatch(format!("no dimension '{dim}' to sum over"))
        })?;
        let mut dims = self.dims.clone();
        dims.remove(a);
        let sums = self
            .values
            .fold_axis(Axis(a), T::default(), |acc, x| acc.clone() + x.clone());
        let mut summed = LabeledArray::from_parts(sums, dims)?;
        summed.coords = self.coords_without(dim);
        summed.attrs = self.attrs.clone();
        Ok(summed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn grid() -> LabeledArray<f64> {
        let values = Array2::from_shape_fn((2, 3), |(i, j)| (10 * i + j) as f64).into_dyn();
        LabeledArray::new(values, &["x", "y"])
            .unwrap()
            .with_coord("x", Coordinate::along("x", vec![0.0, 1.0]))
            .unwrap()
            .with_coord("y", Coordinate::along("y", vec![0.0, 0.5, 1.0]))
            .unwrap()
            .with_coord("z", Coordinate::scalar(2.0))
            .unwrap()
    }

    #[test]
    fn test_new_rejects_rank_mismatch() {
        let values = Array1::from(vec![1.0, 2.0]).into_dyn();
        assert!(LabeledArray::new(values.clone(), &["a", "b"]).is_err());
        assert!(LabeledArray::new(values, &["a"]).is_ok());
    }

    #[test]
    fn test_with_coord_checks_length() {
        let err = grid().with_coord("x", Coordinate::along("x", vec![0.0, 1.0, 2.0]));
        assert!(matches!(err, Err(ScatteringError::ShapeMismatch(_))));
    }

    #[test]
    fn test_stacked_is_row_major_with_broadcast_coords() {
        let flat = grid().stacked(FLAT);
        assert_eq!(flat.dims(), &[FLAT.to_string()]);
        assert_eq!(flat.shape(), &[6]);

        let values: Vec<f64> = flat.values().iter().copied().collect();
        assert_eq!(values, vec![0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);

        let x = flat.float_coord("x").unwrap();
        let y = flat.float_coord("y").unwrap();
        let z = flat.float_coord("z").unwrap();
        assert_eq!(x.to_vec(), vec![0.0, 0.0, 0.0, 1.0, 1.0, 1.0]);
        assert_eq!(y.to_vec(), vec![0.0, 0.5, 1.0, 0.0, 0.5, 1.0]);
        assert_eq!(z.to_vec(), vec![2.0; 6]);
    }

    #[test]
    fn test_unstacked_inverts_stacked() {
        let g = grid();
        let round = g.stacked(FLAT).unstacked(FLAT, &g).unwrap();
        assert_eq!(round.dims(), g.dims());
        assert_eq!(round.values(), g.values());
        assert_eq!(round.coord("x"), g.coord("x"));
        assert_eq!(round.coord("z"), g.coord("z"));
    }

    #[test]
    fn test_concat_and_select() {
        let g = grid();
        let doubled = g.map(|v| 2.0 * v);
        let both =
            LabeledArray::concat(&[g.clone(), doubled], ILLUMINATION, vec!["red".into(), "green".into()])
                .unwrap();
        assert_eq!(both.shape(), &[2, 2, 3]);
        assert_eq!(both.dims()[0], ILLUMINATION);

        let green = both.select(ILLUMINATION, "green").unwrap();
        assert_eq!(green.values()[[1, 2]], 24.0);
        assert!(!green.has_coord(ILLUMINATION));
        assert!(both.select(ILLUMINATION, "blue").is_err());
    }

    #[test]
    fn test_zip_with_broadcasts_by_name() {
        let g = grid();
        let offsets = LabeledArray::new(Array1::from(vec![100.0, 200.0, 300.0]).into_dyn(), &["y"])
            .unwrap();
        let sum = g.zip_with(&offsets, |a, b| a + b).unwrap();
        assert_eq!(sum.values()[[0, 0]], 100.0);
        assert_eq!(sum.values()[[1, 2]], 312.0);

        let stray = LabeledArray::new(Array1::from(vec![1.0]).into_dyn(), &["w"]).unwrap();
        assert!(g.zip_with(&stray, |a, b| a + b).is_err());
    }

    #[test]
    fn test_sum_over_drops_dimension_coords() {
        let summed = grid().sum_over("y").unwrap();
        assert_eq!(summed.dims(), &["x".to_string()]);
        assert_eq!(summed.values()[[1]], 33.0);
        assert!(!summed.has_coord("y"));
        assert!(summed.has_coord("x"));
    }

    #[test]
    fn test_superposed_requires_matching_shape() {
        let g = grid();
        let sum = g.clone().superposed(&g).unwrap();
        assert_eq!(sum.values()[[1, 1]], 22.0);
        let other = g.stacked(FLAT);
        assert!(g.superposed(&other).is_err());
    }
}
