// Skin-tone segmentation.
//
// Scans the frame in row-major order and grows a 4-connected component from
// every unvisited skin pixel. The fill uses an explicit stack and a visited
// bitmap the size of the frame, so a frame-sized blob costs memory, not
// recursion depth. Components of 100 pixels or fewer are discarded.

use crate::analyzer::region::Region;
use crate::frame::Frame;
use tracing::{debug, trace};

/// Components must contain more than this many pixels to become a region
pub const MIN_REGION_PIXELS: u32 = 100;

/// Fixed RGB inequality test for plausible skin
pub fn is_skin_tone(r: u8, g: u8, b: u8) -> bool {
    let (r, g, b) = (r as i32, g as i32, b as i32);
    r > 95
        && g > 40
        && b > 20
        && r - g > 15
        && r - b > 15
        && r > g
        && r > b
        && (r - g).abs() < 60
}

/// Connected-component extractor over the skin-tone predicate
#[derive(Debug, Default, Clone, Copy)]
pub struct RegionSegmenter;

struct Component {
    min_x: usize,
    min_y: usize,
    max_x: usize,
    max_y: usize,
    pixel_count: u32,
}

impl RegionSegmenter {
    pub fn new() -> Self {
        Self
    }

    /// Extract skin-tone regions (before merging), in discovery order
    pub fn segment(&self, frame: &Frame) -> Vec<Region> {
        let width = frame.width() as usize;
        let height = frame.height() as usize;
        let mut visited = vec![false; width * height];
        let mut stack = Vec::new();
        let mut regions = Vec::new();
        let mut discarded = 0usize;

        for start in 0..width * height {
            if visited[start] {
                continue;
            }

            let (r, g, b) = frame.rgb(start);
            if !is_skin_tone(r, g, b) {
                continue;
            }

            let component = flood_fill(frame, start, &mut visited, &mut stack);
            if component.pixel_count > MIN_REGION_PIXELS {
                regions.push(Region::new(
                    component.min_x as i32,
                    component.min_y as i32,
                    (component.max_x - component.min_x + 1) as i32,
                    (component.max_y - component.min_y + 1) as i32,
                    component.pixel_count,
                ));
            } else {
                trace!(
                    "Discarding {}-pixel component at index {}",
                    component.pixel_count,
                    start
                );
                discarded += 1;
            }
        }

        debug!(
            "Frame {}: {} skin regions kept, {} small components discarded",
            frame.id,
            regions.len(),
            discarded
        );
        regions
    }
}

fn flood_fill(
    frame: &Frame,
    start: usize,
    visited: &mut [bool],
    stack: &mut Vec<usize>,
) -> Component {
    let width = frame.width() as usize;
    let height = frame.height() as usize;

    let mut component = Component {
        min_x: usize::MAX,
        min_y: usize::MAX,
        max_x: 0,
        max_y: 0,
        pixel_count: 0,
    };

    stack.clear();
    stack.push(start);

    while let Some(index) = stack.pop() {
        if visited[index] {
            continue;
        }
        visited[index] = true;
        component.pixel_count += 1;

        let x = index % width;
        let y = index / width;
        component.min_x = component.min_x.min(x);
        component.min_y = component.min_y.min(y);
        component.max_x = component.max_x.max(x);
        component.max_y = component.max_y.max(y);

        let neighbors = [
            (y > 0).then(|| index - width),
            (y + 1 < height).then(|| index + width),
            (x > 0).then(|| index - 1),
            (x + 1 < width).then(|| index + 1),
        ];

        for neighbor in neighbors.into_iter().flatten() {
            if visited[neighbor] {
                continue;
            }
            let (r, g, b) = frame.rgb(neighbor);
            if is_skin_tone(r, g, b) {
                stack.push(neighbor);
            }
        }
    }

    component
}
