//! Virtual detector images: one scalar per navigation position.

use ndarray::arr0;
use scandiff_core::frame;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::exec::{self, Reduced};
use crate::mask::{AnnulusMask, DiskMask};

impl Dataset {
    /// Summed intensity per navigation position, optionally restricted to a
    /// disk on the detector.
    ///
    /// Without a disk this is the total frame intensity; with one it is a
    /// virtual bright-field detector of radius `disk.r`.
    pub fn virtual_bright_field(&self, disk: Option<DiskMask>) -> Result<Reduced<f64>> {
        if let Some(d) = disk {
            d.validate()?;
        }
        Ok(exec::map_frames(self, vec![], move |f, _| {
            let sum = match disk {
                Some(d) => frame::annular_sum_frame(f, d.cx, d.cy, 0.0, d.r),
                None => f.sum(),
            };
            arr0(sum).into_dyn()
        }))
    }

    /// Summed intensity inside an annulus per navigation position, i.e. a
    /// virtual annular dark-field detector.
    pub fn virtual_annular_dark_field(&self, annulus: AnnulusMask) -> Result<Reduced<f64>> {
        annulus.validate()?;
        Ok(exec::map_frames(self, vec![], move |f, _| {
            arr0(frame::annular_sum_frame(
                f,
                annulus.cx,
                annulus.cy,
                annulus.r_inner,
                annulus.r_outer,
            ))
            .into_dyn()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::test_utils::{disk_frame, impulse_frame, ring_frame, stack};
    use ndarray::{ArrayD, IxDyn};

    fn scalar(a: &ArrayD<f64>) -> f64 {
        a[IxDyn(&[])]
    }

    #[test]
    fn bright_field_without_disk_is_total_intensity() {
        let data = stack(&[2, 2], |i| disk_frame(8, 8, 4.0, 4.0, 2.0, i as f64 + 1.0));
        let ds = Dataset::from_array(data).unwrap();
        let bf = ds.virtual_bright_field(None).unwrap().materialize();
        assert_eq!(bf.shape(), &[2, 2]);
        assert!(bf[[0, 1]] > bf[[0, 0]]);
    }

    #[test]
    fn disk_limits_bright_field_to_central_beam() {
        let mut f = disk_frame(16, 16, 8.0, 8.0, 2.0, 3.0);
        f[[0, 0]] = 1000.0;
        let ds = Dataset::from_frame(f);
        let full = ds.virtual_bright_field(None).unwrap().materialize();
        let disk = DiskMask::new(8.0, 8.0, 3.0);
        let central = ds.virtual_bright_field(Some(disk)).unwrap().materialize();
        assert!(scalar(&full) > scalar(&central) + 999.0);
        assert!(scalar(&central) > 0.0);
    }

    #[test]
    fn dark_field_sees_the_ring_but_not_the_beam() {
        let mut f = ring_frame(24, 24, 12.0, 12.0, 8, 2.0);
        f[[12, 12]] = 500.0;
        let ds = Dataset::from_frame(f);
        let adf = ds
            .virtual_annular_dark_field(AnnulusMask::new(12.0, 12.0, 5.0, 10.0))
            .unwrap()
            .materialize();
        let ring_total = ring_frame(24, 24, 12.0, 12.0, 8, 2.0).sum();
        assert_eq!(scalar(&adf), ring_total);
    }

    #[test]
    fn annulus_bounds_are_inclusive() {
        let ds = Dataset::from_frame(impulse_frame(11, 11, 5, 8, 4.0));
        // Impulse at distance exactly 3 from the centre.
        let exact = ds
            .virtual_annular_dark_field(AnnulusMask::new(5.0, 5.0, 3.0, 4.0))
            .unwrap()
            .materialize();
        assert_eq!(scalar(&exact), 4.0);
        let outside = ds
            .virtual_annular_dark_field(AnnulusMask::new(5.0, 5.0, 3.5, 4.0))
            .unwrap()
            .materialize();
        assert_eq!(scalar(&outside), 0.0);
    }

    #[test]
    fn invalid_annulus_is_rejected() {
        let ds = Dataset::from_frame(disk_frame(8, 8, 4.0, 4.0, 2.0, 1.0));
        assert!(matches!(
            ds.virtual_annular_dark_field(AnnulusMask::new(4.0, 4.0, 5.0, 3.0)),
            Err(Error::ParameterRange { name: "r_outer", .. })
        ));
    }

    #[test]
    fn virtual_images_agree_between_modes() {
        let data = stack(&[3, 2], |i| ring_frame(16, 16, 8.0, 8.0, 2 + i % 4, 1.0));
        let eager = Dataset::from_array(data.clone()).unwrap();
        let lazy = Dataset::from_array(data).unwrap().into_deferred(4).unwrap();
        let annulus = AnnulusMask::new(8.0, 8.0, 1.0, 6.0);
        let a = eager.virtual_annular_dark_field(annulus).unwrap();
        let b = lazy.virtual_annular_dark_field(annulus).unwrap();
        assert!(b.is_deferred());
        assert_eq!(a.materialize(), b.materialize());
    }
}
