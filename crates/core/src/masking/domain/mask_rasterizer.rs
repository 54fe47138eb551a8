use crate::shared::constants::{MASK_PRESERVE_COLOR, MASK_REMOVE_COLOR};
use crate::shared::frame::Frame;
use crate::shared::region::Region;

/// Builds the mask frame template for a `width × height` video.
///
/// Every pixel is black except the part of `region` that falls inside the
/// frame, which is white. A region entirely outside the frame yields an
/// all-black mask.
pub fn rasterize(width: u32, height: u32, region: &Region) -> Frame {
    let mut frame = Frame::filled(width, height, MASK_PRESERVE_COLOR);
    if let Some(bounds) = region.clamp_to(width, height) {
        frame.fill_rect(&bounds, MASK_REMOVE_COLOR);
    }
    frame
}

/// Number of pixels marked for removal.
pub fn remove_pixel_count(mask: &Frame) -> usize {
    mask.data()
        .chunks_exact(mask.channels().max(1) as usize)
        .filter(|px| *px == MASK_REMOVE_COLOR)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn assert_mask_matches(mask: &Frame, region: &Region) {
        for row in 0..mask.height() {
            for col in 0..mask.width() {
                let expected = if region.contains(i64::from(col), i64::from(row)) {
                    MASK_REMOVE_COLOR
                } else {
                    MASK_PRESERVE_COLOR
                };
                assert_eq!(
                    mask.pixel(col, row).unwrap(),
                    &expected[..],
                    "pixel ({col}, {row})"
                );
            }
        }
    }

    #[test]
    fn test_mask_has_frame_geometry() {
        let mask = rasterize(640, 360, &Region::new(100, 50, 200, 80));
        assert_eq!(mask.width(), 640);
        assert_eq!(mask.height(), 360);
        assert_eq!(mask.channels(), 3);
    }

    #[test]
    fn test_reference_rectangle_spans_expected_rows_and_columns() {
        let region = Region::new(100, 50, 200, 80);
        let mask = rasterize(640, 360, &region);

        assert_mask_matches(&mask, &region);
        assert_eq!(mask.pixel(100, 50).unwrap(), &MASK_REMOVE_COLOR[..]);
        assert_eq!(mask.pixel(299, 129).unwrap(), &MASK_REMOVE_COLOR[..]);
        assert_eq!(mask.pixel(300, 129).unwrap(), &MASK_PRESERVE_COLOR[..]);
        assert_eq!(mask.pixel(299, 130).unwrap(), &MASK_PRESERVE_COLOR[..]);
        assert_eq!(remove_pixel_count(&mask), 200 * 80);
    }

    #[rstest]
    #[case::inside(Region::new(3, 2, 4, 3))]
    #[case::single_pixel(Region::new(0, 0, 1, 1))]
    #[case::full_frame(Region::new(0, 0, 12, 9))]
    #[case::bottom_right_corner(Region::new(11, 8, 1, 1))]
    fn test_rectangle_is_half_open(#[case] region: Region) {
        let mask = rasterize(12, 9, &region);
        assert_mask_matches(&mask, &region);
    }

    #[rstest]
    #[case::right(Region::new(12, 0, 5, 5))]
    #[case::below(Region::new(0, 9, 5, 5))]
    #[case::left(Region::new(-10, 0, 10, 5))]
    #[case::above(Region::new(0, -10, 5, 10))]
    #[case::far_away(Region::new(10_000, 10_000, 5, 5))]
    #[case::zero_size(Region::new(2, 2, 0, 0))]
    #[case::negative_size(Region::new(5, 5, -3, -3))]
    fn test_invisible_region_gives_all_preserve_mask(#[case] region: Region) {
        let mask = rasterize(12, 9, &region);
        assert_eq!(remove_pixel_count(&mask), 0);
        assert!(mask.data().iter().all(|&b| b == 0));
    }

    #[test]
    fn test_partially_outside_region_is_clipped() {
        let mask = rasterize(12, 9, &Region::new(-2, 6, 5, 10));
        // Visible part: columns 0..3, rows 6..9
        assert_eq!(remove_pixel_count(&mask), 3 * 3);
        assert_eq!(mask.pixel(0, 8).unwrap(), &MASK_REMOVE_COLOR[..]);
        assert_eq!(mask.pixel(3, 8).unwrap(), &MASK_PRESERVE_COLOR[..]);
        assert_eq!(mask.pixel(0, 5).unwrap(), &MASK_PRESERVE_COLOR[..]);
    }

    #[test]
    fn test_mask_only_contains_binary_values() {
        let mask = rasterize(33, 17, &Region::new(5, 5, 9, 4));
        assert!(mask.data().iter().all(|&b| b == 0 || b == 255));
    }

    #[test]
    fn test_rasterize_is_deterministic() {
        let region = Region::new(7, 3, 11, 5);
        assert_eq!(rasterize(40, 20, &region), rasterize(40, 20, &region));
    }
}
