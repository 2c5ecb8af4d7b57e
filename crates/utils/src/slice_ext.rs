use crate::error::{Error, Result};

/// Extends functionality for slices of float arrays
pub trait SliceExt<T> {
    /// Find the minimum value in float arrays
    ///
    /// Only provides the minimum value from a collection of valid numbers. Any
    /// NAN values, infinite values, or empty slices will return an error.
    ///
    /// ```rust
    /// # use geokit_utils::SliceExt;
    /// # use geokit_utils::Error;
    /// // Successful cases
    /// assert_eq!([1.1, 0.5, 2.2].try_min(), Ok(0.5));
    ///
    /// // Error cases
    /// assert_eq!([1.1, f64::NAN, 2.2].try_min(), Err(Error::SliceContainsUndefinedValues));
    /// assert_eq!(Vec::<f64>::new().try_min(), Err(Error::SliceContainsNoValues));
    /// ```
    ///
    /// The float primitives do not implement `Ord` due to `NaN` being
    /// incomparable, so `total_cmp` is used for the ordering.
    fn try_min(&self) -> Result<T>;

    /// Find the maximum value in float arrays
    ///
    /// ```rust
    /// # use geokit_utils::SliceExt;
    /// assert_eq!([1.1, 0.5, 2.2].try_max(), Ok(2.2));
    /// ```
    fn try_max(&self) -> Result<T>;

    /// Minimum and maximum of the finite values only
    ///
    /// Masked entries in gridded formats are stored as `NaN`, so these are
    /// skipped rather than treated as an error.
    ///
    /// ```rust
    /// # use geokit_utils::SliceExt;
    /// assert_eq!([f64::NAN, 3.0, -1.0].finite_range(), Ok((-1.0, 3.0)));
    /// ```
    fn finite_range(&self) -> Result<(T, T)>;

    /// Arithmetic mean of the values
    ///
    /// ```rust
    /// # use geokit_utils::SliceExt;
    /// assert_eq!([1.0, 2.0, 3.0].try_mean(), Ok(2.0));
    /// ```
    fn try_mean(&self) -> Result<T>;

    /// Index of the first value closest to `value`
    ///
    /// Used for resolving a requested time to a timestep index.
    ///
    /// ```rust
    /// # use geokit_utils::SliceExt;
    /// let times = vec![0.0, 1.0, 2.0];
    /// assert_eq!(times.find_nearest(1.4), Ok(1));
    /// assert_eq!(times.find_nearest(9.0), Ok(2));
    /// assert_eq!(times.find_nearest(-3.0), Ok(0));
    /// ```
    fn find_nearest(&self, value: T) -> Result<usize>;
}

impl SliceExt<f64> for [f64] {
    fn try_min(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        self.iter()
            .min_by(|a, b| a.total_cmp(b))
            .copied()
            .ok_or(Error::SliceContainsNoValues)
    }

    fn try_max(&self) -> Result<f64> {
        if self.iter().any(|v| !v.is_finite()) {
            return Err(Error::SliceContainsUndefinedValues);
        };

        self.iter()
            .max_by(|a, b| a.total_cmp(b))
            .copied()
            .ok_or(Error::SliceContainsNoValues)
    }

    fn finite_range(&self) -> Result<(f64, f64)> {
        let finite = self
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .collect::<Vec<f64>>();
        Ok((finite.try_min()?, finite.try_max()?))
    }

    fn try_mean(&self) -> Result<f64> {
        if self.is_empty() {
            return Err(Error::SliceContainsNoValues);
        }
        Ok(self.iter().sum::<f64>() / self.len() as f64)
    }

    fn find_nearest(&self, value: f64) -> Result<usize> {
        if value.is_nan() || self.iter().any(|v| v.is_nan()) {
            return Err(Error::SliceContainsUndefinedValues);
        }

        // first minimum wins on ties
        let mut best: Option<(usize, f64)> = None;
        for (i, v) in self.iter().enumerate() {
            let distance = (v - value).abs();
            match best {
                Some((_, d)) if d <= distance => (),
                _ => best = Some((i, distance)),
            }
        }

        best.map(|(i, _)| i).ok_or(Error::SliceContainsNoValues)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nearest_prefers_first_on_tie() {
        let values = [0.0, 1.0, 2.0];
        assert_eq!(values.find_nearest(0.5), Ok(0));
        assert_eq!(values.find_nearest(1.5), Ok(1));
    }

    #[test]
    fn nearest_rejects_empty_and_nan() {
        assert_eq!(
            Vec::<f64>::new().find_nearest(1.0),
            Err(Error::SliceContainsNoValues)
        );
        assert_eq!(
            [1.0].find_nearest(f64::NAN),
            Err(Error::SliceContainsUndefinedValues)
        );
    }

    #[test]
    fn finite_range_skips_masked() {
        let values = [f64::NAN, 5.0, f64::INFINITY, -2.0];
        assert_eq!(values.finite_range(), Ok((-2.0, 5.0)));
        assert_eq!(
            [f64::NAN].finite_range(),
            Err(Error::SliceContainsNoValues)
        );
    }
}
