use crate::error::{AnnotationError, AnnotationResult};

/// Linear mapping between a domain interval and a pixel extent `[0, extent]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain_start: f64,
    domain_end: f64,
}

impl LinearScale {
    pub fn new(domain_start: f64, domain_end: f64) -> AnnotationResult<Self> {
        if !domain_start.is_finite() || !domain_end.is_finite() || domain_start == domain_end {
            return Err(AnnotationError::InvalidData(
                "scale domain must be finite and non-zero".to_owned(),
            ));
        }

        Ok(Self {
            domain_start,
            domain_end,
        })
    }

    #[must_use]
    pub fn domain(self) -> (f64, f64) {
        (self.domain_start, self.domain_end)
    }

    pub fn domain_to_pixel(self, value: f64, extent: f64) -> AnnotationResult<f64> {
        validate_extent(extent)?;
        if !value.is_finite() {
            return Err(AnnotationError::InvalidData("value must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = (value - self.domain_start) / span;
        Ok(normalized * extent)
    }

    pub fn pixel_to_domain(self, pixel: f64, extent: f64) -> AnnotationResult<f64> {
        validate_extent(extent)?;
        if !pixel.is_finite() {
            return Err(AnnotationError::InvalidData("pixel must be finite".to_owned()));
        }

        let span = self.domain_end - self.domain_start;
        let normalized = pixel / extent;
        Ok(self.domain_start + normalized * span)
    }
}

fn validate_extent(extent: f64) -> AnnotationResult<()> {
    if !extent.is_finite() || extent <= 0.0 {
        return Err(AnnotationError::InvalidData(
            "pixel extent must be finite and > 0".to_owned(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_degenerate_domain() {
        assert!(LinearScale::new(5.0, 5.0).is_err());
        assert!(LinearScale::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn maps_domain_edges_to_extent_edges() {
        let scale = LinearScale::new(100.0, 200.0).expect("scale");
        assert_eq!(scale.domain_to_pixel(100.0, 500.0).expect("start"), 0.0);
        assert_eq!(scale.domain_to_pixel(200.0, 500.0).expect("end"), 500.0);
        assert_eq!(scale.pixel_to_domain(250.0, 500.0).expect("mid"), 150.0);
    }
}
