use crate::geometry::{Point, ScreenGeometry};
use serde::{Deserialize, Serialize};

pub type Rgba = [u8; 4];

pub const WHITE: Rgba = [255, 255, 255, 255];
pub const BLACK: Rgba = [0, 0, 0, 255];
pub const GREY: Rgba = [45, 45, 45, 255];

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub width: f32,
    pub color: Rgba,
}

/// Drawable shape, sized in pixels
#[derive(Debug, Clone, PartialEq)]
pub enum StimulusType {
    Line {
        length: f32,
        thickness: f32,
        color: Rgba,
        rotation_deg: f32,
    },
    Circle {
        diameter: f32,
        stroke: Option<Stroke>,
        fill: Rgba,
    },
}

impl StimulusType {
    /// Side of the square that fully contains the shape, strokes included.
    pub fn extent(&self) -> f32 {
        match self {
            StimulusType::Line {
                length, thickness, ..
            } => length.max(*thickness) + thickness,
            StimulusType::Circle {
                diameter, stroke, ..
            } => diameter + stroke.map_or(0.0, |s| s.width),
        }
    }
}

/// Names of every stimulus in the catalog. The discriminant doubles as the
/// renderer's cache slot.
#[repr(usize)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StimulusId {
    HorizontalCross = 0,
    VerticalCross = 1,
    XCrossA = 2,
    XCrossB = 3,
    ProbeCircle = 4,
    InnerCircle = 5,
    Cue = 6,
    Target = 7,
}

impl StimulusId {
    pub const COUNT: usize = 8;
    pub const ALL: [StimulusId; Self::COUNT] = [
        StimulusId::HorizontalCross,
        StimulusId::VerticalCross,
        StimulusId::XCrossA,
        StimulusId::XCrossB,
        StimulusId::ProbeCircle,
        StimulusId::InnerCircle,
        StimulusId::Cue,
        StimulusId::Target,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    Center,
    LeftProbe,
    RightProbe,
}

/// Stimulus dimensions in degrees of visual angle, strokes in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StimulusSizes {
    pub cross_deg: f32,
    pub cross_thickness_px: f32,
    pub probe_deg: f32,
    pub inner_deg: f32,
    pub probe_stroke_px: f32,
    pub probe_offset_x_deg: f32,
    pub probe_offset_y_deg: f32,
    pub cue_stroke_px: f32,
    pub target_deg: f32,
    pub target_stroke_px: f32,
}

impl Default for StimulusSizes {
    fn default() -> Self {
        Self {
            cross_deg: 0.57,
            cross_thickness_px: 3.0,
            probe_deg: 0.57,
            inner_deg: 0.4,
            probe_stroke_px: 1.0,
            probe_offset_x_deg: 5.0,
            probe_offset_y_deg: 1.1,
            cue_stroke_px: 2.0,
            target_deg: 0.23,
            target_stroke_px: 1.0,
        }
    }
}

/// Closed set of stimuli and anchor positions for one session.
#[derive(Debug, Clone, PartialEq)]
pub struct StimulusCatalog {
    stimuli: [StimulusType; StimulusId::COUNT],
    center: Point,
    left_probe: Point,
    right_probe: Point,
}

impl StimulusCatalog {
    pub fn build(geometry: &ScreenGeometry, sizes: &StimulusSizes) -> Self {
        let cross_len = geometry.deg_to_px(sizes.cross_deg);
        let line = |rotation_deg: f32| StimulusType::Line {
            length: cross_len,
            thickness: sizes.cross_thickness_px,
            color: WHITE,
            rotation_deg,
        };

        let probe_diameter = geometry.deg_to_px(sizes.probe_deg);
        let probe_stroke = Some(Stroke {
            width: sizes.probe_stroke_px,
            color: BLACK,
        });

        let stimuli = [
            line(0.0),
            line(90.0),
            line(45.0),
            line(-45.0),
            StimulusType::Circle {
                diameter: probe_diameter,
                stroke: probe_stroke,
                fill: WHITE,
            },
            StimulusType::Circle {
                diameter: geometry.deg_to_px(sizes.inner_deg),
                stroke: probe_stroke,
                fill: GREY,
            },
            StimulusType::Circle {
                diameter: probe_diameter,
                stroke: Some(Stroke {
                    width: sizes.cue_stroke_px,
                    color: WHITE,
                }),
                fill: WHITE,
            },
            StimulusType::Circle {
                diameter: geometry.deg_to_px(sizes.target_deg),
                stroke: Some(Stroke {
                    width: sizes.target_stroke_px,
                    color: BLACK,
                }),
                fill: WHITE,
            },
        ];

        let center = geometry.center();
        let dx = geometry.deg_to_px(sizes.probe_offset_x_deg);
        let dy = geometry.deg_to_px(sizes.probe_offset_y_deg);

        Self {
            stimuli,
            center,
            left_probe: Point::new(center.x - dx, center.y - dy),
            right_probe: Point::new(center.x + dx, center.y - dy),
        }
    }

    pub fn get(&self, id: StimulusId) -> &StimulusType {
        &self.stimuli[id.index()]
    }

    pub fn anchor(&self, anchor: Anchor) -> Point {
        match anchor {
            Anchor::Center => self.center,
            Anchor::LeftProbe => self.left_probe,
            Anchor::RightProbe => self.right_probe,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (StimulusId, &StimulusType)> {
        StimulusId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> (ScreenGeometry, StimulusCatalog) {
        let geometry = ScreenGeometry::new(1920, 1080, 530.0, 570.0);
        let catalog = StimulusCatalog::build(&geometry, &StimulusSizes::default());
        (geometry, catalog)
    }

    #[test]
    fn probes_are_mirrored_around_center_and_raised() {
        let (geometry, catalog) = catalog();
        let c = catalog.anchor(Anchor::Center);
        let l = catalog.anchor(Anchor::LeftProbe);
        let r = catalog.anchor(Anchor::RightProbe);

        assert_eq!(c, geometry.center());
        assert!((c.x - l.x - (r.x - c.x)).abs() < 1e-3);
        assert_eq!(l.y, r.y);
        assert!(l.y < c.y);
        assert!((c.x - l.x - geometry.deg_to_px(5.0)).abs() < 1e-3);
    }

    #[test]
    fn cross_lines_share_length_and_differ_in_rotation() {
        let (_, catalog) = catalog();
        let rotations: Vec<f32> = [
            StimulusId::HorizontalCross,
            StimulusId::VerticalCross,
            StimulusId::XCrossA,
            StimulusId::XCrossB,
        ]
        .into_iter()
        .map(|id| match catalog.get(id) {
            StimulusType::Line { rotation_deg, .. } => *rotation_deg,
            other => panic!("expected a line, got {other:?}"),
        })
        .collect();
        assert_eq!(rotations, vec![0.0, 90.0, 45.0, -45.0]);
    }

    #[test]
    fn inner_circle_is_grey_and_smaller_than_probe() {
        let (_, catalog) = catalog();
        let (StimulusType::Circle { diameter: probe, .. }, StimulusType::Circle { diameter: inner, fill, .. }) =
            (catalog.get(StimulusId::ProbeCircle), catalog.get(StimulusId::InnerCircle))
        else {
            panic!("probe and inner must be circles");
        };
        assert!(inner < probe);
        assert_eq!(*fill, GREY);
    }

    #[test]
    fn cue_has_white_stroke_and_target_is_smallest() {
        let (_, catalog) = catalog();
        match catalog.get(StimulusId::Cue) {
            StimulusType::Circle { stroke, .. } => {
                assert_eq!(
                    *stroke,
                    Some(Stroke {
                        width: 2.0,
                        color: WHITE
                    })
                );
            }
            other => panic!("unexpected cue {other:?}"),
        }
        let target = catalog.get(StimulusId::Target).extent();
        assert!(catalog
            .iter()
            .filter(|(id, _)| *id != StimulusId::Target)
            .all(|(_, s)| s.extent() > target));
    }

    #[test]
    fn ids_map_to_distinct_slots() {
        let mut slots: Vec<usize> = StimulusId::ALL.iter().map(|id| id.index()).collect();
        slots.dedup();
        assert_eq!(slots, (0..StimulusId::COUNT).collect::<Vec<_>>());
    }
}
