// SPDX-License-Identifier: MPL-2.0

//! Operation dispatch table
//!
//! Every button of the workbench maps to one [`OperationKind`]. Kinds that
//! need input declare it through [`Requirement`]: a numeric prompt, an
//! interactive tool, or a live preview with sliders. Once the input is
//! known the kind becomes an [`Operation`], which runs against a fresh copy
//! of the loaded image and yields either a new processed image or a set of
//! result panels.

pub mod edges;
pub mod features;
pub mod filters;
pub mod geometry;
pub mod morphology;
pub mod segment;

pub use geometry::Selection;

use crate::constants::ops;
use crate::detect::FaceDetector;
use crate::errors::{AppError, AppResult, OperationError};
use crate::media::Frame;
use image::GrayImage;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Button groups in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationCategory {
    Filters,
    Edges,
    Features,
    Segmentation,
    Morphology,
    Geometry,
}

impl OperationCategory {
    pub const ALL: [OperationCategory; 6] = [
        OperationCategory::Filters,
        OperationCategory::Edges,
        OperationCategory::Features,
        OperationCategory::Segmentation,
        OperationCategory::Morphology,
        OperationCategory::Geometry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OperationCategory::Filters => "Filters",
            OperationCategory::Edges => "Edges",
            OperationCategory::Features => "Features",
            OperationCategory::Segmentation => "Segmentation",
            OperationCategory::Morphology => "Morphology",
            OperationCategory::Geometry => "Geometry",
        }
    }

    /// Kinds in this category, in button order
    pub fn kinds(self) -> impl Iterator<Item = OperationKind> {
        OperationKind::ALL
            .into_iter()
            .filter(move |kind| kind.category() == self)
    }
}

/// One entry of the dispatch table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    LogTransform,
    GaussianBlur,
    Median,
    Averaging,
    DifferenceFilters,
    Sharpen,
    Sobel,
    Canny,
    FacesEyes,
    HoughCircles,
    HoughLines,
    HarrisCorners,
    GreenBallMask,
    MaskObject,
    KMeans,
    WatershedAuto,
    WatershedMarkers,
    MorphBasic,
    MorphOpening,
    Rotation,
    Translation,
    Zoom,
    Crop,
}

/// Interactive tools that collect pointer input before running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Crop,
    MaskObject,
    Watershed,
}

/// Operations tuned with sliders against a live preview
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviewKind {
    Blur,
    Canny,
    Sharpen,
}

/// What a kind needs before it can run
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Requirement {
    None,
    Prompt(&'static [PromptField]),
    Tool(ToolKind),
    Preview(PreviewKind),
}

/// A bounded numeric input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromptField {
    /// Name used by `--param key=value`
    pub key: &'static str,
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
    pub integer: bool,
    pub default: f64,
}

impl PromptField {
    const fn int(key: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            key,
            label,
            min,
            max,
            integer: true,
            default,
        }
    }

    const fn float(key: &'static str, label: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self {
            key,
            label,
            min,
            max,
            integer: false,
            default,
        }
    }

    /// Parse user text, returning a message suitable for the dialog on failure
    pub fn parse(&self, text: &str) -> Result<f64, String> {
        let value: f64 = text
            .trim()
            .parse()
            .map_err(|_| format!("{}: enter a number", self.label))?;
        self.check(value)
    }

    /// Validate an already numeric value
    pub fn check(&self, value: f64) -> Result<f64, String> {
        if !value.is_finite() {
            return Err(format!("{}: enter a number", self.label));
        }
        if self.integer && value.fract() != 0.0 {
            return Err(format!("{}: enter a whole number", self.label));
        }
        if value < self.min || value > self.max {
            return Err(format!(
                "{}: must be between {} and {}",
                self.label, self.min, self.max
            ));
        }
        Ok(value)
    }
}

const KMEANS_FIELDS: &[PromptField] = &[PromptField::int(
    "k",
    "Number of clusters (K)",
    ops::KMEANS_MIN as f64,
    ops::KMEANS_MAX as f64,
    ops::KMEANS_DEFAULT as f64,
)];

const ROTATION_FIELDS: &[PromptField] = &[PromptField::float(
    "angle",
    "Rotation angle (degrees)",
    -ops::ROTATION_LIMIT,
    ops::ROTATION_LIMIT,
    45.0,
)];

const TRANSLATION_FIELDS: &[PromptField] = &[
    PromptField::int(
        "dx",
        "Horizontal shift (pixels)",
        -ops::TRANSLATION_LIMIT,
        ops::TRANSLATION_LIMIT,
        50.0,
    ),
    PromptField::int(
        "dy",
        "Vertical shift (pixels)",
        -ops::TRANSLATION_LIMIT,
        ops::TRANSLATION_LIMIT,
        50.0,
    ),
];

const ZOOM_FIELDS: &[PromptField] = &[PromptField::float(
    "factor",
    "Zoom factor",
    ops::ZOOM_MIN,
    ops::ZOOM_MAX,
    1.5,
)];

const BLUR_FIELDS: &[PromptField] = &[PromptField::int(
    "ksize",
    "Kernel size",
    ops::BLUR_KSIZE_MIN as f64,
    ops::BLUR_KSIZE_MAX as f64,
    ops::BLUR_KSIZE_DEFAULT as f64,
)];

const CANNY_FIELDS: &[PromptField] = &[
    PromptField::int("low", "Threshold 1", 0.0, 255.0, ops::CANNY_DEFAULT_LOW as f64),
    PromptField::int("high", "Threshold 2", 0.0, 255.0, ops::CANNY_DEFAULT_HIGH as f64),
];

const SHARPEN_FIELDS: &[PromptField] = &[PromptField::int(
    "amount",
    "Amount",
    0.0,
    ops::SHARPEN_AMOUNT_MAX as f64,
    ops::SHARPEN_AMOUNT_DEFAULT as f64,
)];

/// Rectangle fields, only reachable from the command line
const SELECTION_FIELDS: &[PromptField] = &[
    PromptField::int("x", "Left", 0.0, 1.0e6, 0.0),
    PromptField::int("y", "Top", 0.0, 1.0e6, 0.0),
    PromptField::int("width", "Width", 0.0, 1.0e6, 0.0),
    PromptField::int("height", "Height", 0.0, 1.0e6, 0.0),
];

impl OperationKind {
    pub const ALL: [OperationKind; 23] = [
        OperationKind::LogTransform,
        OperationKind::GaussianBlur,
        OperationKind::Median,
        OperationKind::Averaging,
        OperationKind::DifferenceFilters,
        OperationKind::Sharpen,
        OperationKind::Sobel,
        OperationKind::Canny,
        OperationKind::FacesEyes,
        OperationKind::HoughCircles,
        OperationKind::HoughLines,
        OperationKind::HarrisCorners,
        OperationKind::GreenBallMask,
        OperationKind::MaskObject,
        OperationKind::KMeans,
        OperationKind::WatershedAuto,
        OperationKind::WatershedMarkers,
        OperationKind::MorphBasic,
        OperationKind::MorphOpening,
        OperationKind::Rotation,
        OperationKind::Translation,
        OperationKind::Zoom,
        OperationKind::Crop,
    ];

    /// Stable identifier used on the command line
    pub fn id(&self) -> &'static str {
        match self {
            OperationKind::LogTransform => "log",
            OperationKind::GaussianBlur => "blur",
            OperationKind::Median => "median",
            OperationKind::Averaging => "average",
            OperationKind::DifferenceFilters => "difference",
            OperationKind::Sharpen => "sharpen",
            OperationKind::Sobel => "sobel",
            OperationKind::Canny => "canny",
            OperationKind::FacesEyes => "faces",
            OperationKind::HoughCircles => "circles",
            OperationKind::HoughLines => "lines",
            OperationKind::HarrisCorners => "corners",
            OperationKind::GreenBallMask => "green-ball",
            OperationKind::MaskObject => "mask-object",
            OperationKind::KMeans => "kmeans",
            OperationKind::WatershedAuto => "watershed",
            OperationKind::WatershedMarkers => "watershed-markers",
            OperationKind::MorphBasic => "morph-basic",
            OperationKind::MorphOpening => "morph-opening",
            OperationKind::Rotation => "rotate",
            OperationKind::Translation => "translate",
            OperationKind::Zoom => "zoom",
            OperationKind::Crop => "crop",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Button caption
    pub fn label(&self) -> &'static str {
        match self {
            OperationKind::LogTransform => "Log Transform",
            OperationKind::GaussianBlur => "Gaussian Blur",
            OperationKind::Median => "Median Filter",
            OperationKind::Averaging => "Averaging Filter",
            OperationKind::DifferenceFilters => "Difference Filters",
            OperationKind::Sharpen => "Sharpen",
            OperationKind::Sobel => "Sobel",
            OperationKind::Canny => "Canny",
            OperationKind::FacesEyes => "Detect Faces & Eyes",
            OperationKind::HoughCircles => "Hough Circles",
            OperationKind::HoughLines => "Hough Lines",
            OperationKind::HarrisCorners => "Harris Corners",
            OperationKind::GreenBallMask => "Green Ball Mask",
            OperationKind::MaskObject => "Mask Object",
            OperationKind::KMeans => "K-Means",
            OperationKind::WatershedAuto => "Watershed",
            OperationKind::WatershedMarkers => "Interactive Watershed",
            OperationKind::MorphBasic => "Erode / Dilate / Gradient",
            OperationKind::MorphOpening => "Opening / Top-hat",
            OperationKind::Rotation => "Rotate",
            OperationKind::Translation => "Translate",
            OperationKind::Zoom => "Zoom",
            OperationKind::Crop => "Crop",
        }
    }

    pub fn category(&self) -> OperationCategory {
        match self {
            OperationKind::LogTransform
            | OperationKind::GaussianBlur
            | OperationKind::Median
            | OperationKind::Averaging
            | OperationKind::DifferenceFilters
            | OperationKind::Sharpen => OperationCategory::Filters,
            OperationKind::Sobel | OperationKind::Canny => OperationCategory::Edges,
            OperationKind::FacesEyes
            | OperationKind::HoughCircles
            | OperationKind::HoughLines
            | OperationKind::HarrisCorners
            | OperationKind::GreenBallMask
            | OperationKind::MaskObject => OperationCategory::Features,
            OperationKind::KMeans
            | OperationKind::WatershedAuto
            | OperationKind::WatershedMarkers => OperationCategory::Segmentation,
            OperationKind::MorphBasic | OperationKind::MorphOpening => {
                OperationCategory::Morphology
            }
            OperationKind::Rotation
            | OperationKind::Translation
            | OperationKind::Zoom
            | OperationKind::Crop => OperationCategory::Geometry,
        }
    }

    pub fn requirement(&self) -> Requirement {
        match self {
            OperationKind::KMeans => Requirement::Prompt(KMEANS_FIELDS),
            OperationKind::Rotation => Requirement::Prompt(ROTATION_FIELDS),
            OperationKind::Translation => Requirement::Prompt(TRANSLATION_FIELDS),
            OperationKind::Zoom => Requirement::Prompt(ZOOM_FIELDS),
            OperationKind::GaussianBlur => Requirement::Preview(PreviewKind::Blur),
            OperationKind::Canny => Requirement::Preview(PreviewKind::Canny),
            OperationKind::Sharpen => Requirement::Preview(PreviewKind::Sharpen),
            OperationKind::Crop => Requirement::Tool(ToolKind::Crop),
            OperationKind::MaskObject => Requirement::Tool(ToolKind::MaskObject),
            OperationKind::WatershedMarkers => Requirement::Tool(ToolKind::Watershed),
            _ => Requirement::None,
        }
    }

    /// Numeric inputs accepted by [`Operation::from_values`], in order
    pub fn fields(&self) -> &'static [PromptField] {
        match self.requirement() {
            Requirement::Prompt(fields) => fields,
            Requirement::Preview(kind) => kind.fields(),
            Requirement::Tool(ToolKind::Crop | ToolKind::MaskObject) => SELECTION_FIELDS,
            Requirement::Tool(ToolKind::Watershed) | Requirement::None => &[],
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl PreviewKind {
    /// Slider ranges
    pub fn fields(&self) -> &'static [PromptField] {
        match self {
            PreviewKind::Blur => BLUR_FIELDS,
            PreviewKind::Canny => CANNY_FIELDS,
            PreviewKind::Sharpen => SHARPEN_FIELDS,
        }
    }

    pub fn operation_kind(&self) -> OperationKind {
        match self {
            PreviewKind::Blur => OperationKind::GaussianBlur,
            PreviewKind::Canny => OperationKind::Canny,
            PreviewKind::Sharpen => OperationKind::Sharpen,
        }
    }
}

/// A fully parameterised operation
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    LogTransform,
    GaussianBlur { ksize: u32 },
    Median,
    Averaging,
    DifferenceFilters,
    Sharpen { amount: u32 },
    Sobel,
    Canny { low: u8, high: u8 },
    FacesEyes,
    HoughCircles,
    HoughLines,
    HarrisCorners,
    GreenBallMask,
    MaskObject { selection: Selection },
    KMeans { k: u32 },
    WatershedAuto,
    /// Marker image: 0 unknown, 1 foreground, 2 background
    WatershedMarkers { markers: GrayImage },
    MorphBasic,
    MorphOpening,
    Rotation { degrees: f64 },
    Translation { dx: i32, dy: i32 },
    Zoom { factor: f64 },
    Crop { selection: Selection },
}

/// Shared resources an operation may consult
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    pub detector: Option<Arc<FaceDetector>>,
}

/// One titled image of a multi-panel result
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: String,
    pub frame: Frame,
}

impl Panel {
    pub fn new(title: impl Into<String>, frame: Frame) -> Self {
        Self {
            title: title.into(),
            frame,
        }
    }
}

/// Result of running an operation
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutput {
    /// Becomes the new processed image
    Single(Frame),
    /// Shown side by side; the processed image is left as it was
    Panels {
        panels: Vec<Panel>,
        note: Option<String>,
    },
}

impl Operation {
    /// Build an operation from numeric values matching [`OperationKind::fields`]
    pub fn from_values(kind: OperationKind, values: &[f64]) -> AppResult<Self> {
        let fields = kind.fields();
        if values.len() != fields.len() {
            return Err(OperationError::InvalidParameter(format!(
                "{} expects {} value(s), got {}",
                kind.id(),
                fields.len(),
                values.len()
            ))
            .into());
        }
        for (field, value) in fields.iter().zip(values) {
            field
                .check(*value)
                .map_err(OperationError::InvalidParameter)?;
        }

        let selection = || Selection {
            x: values[0] as u32,
            y: values[1] as u32,
            width: values[2] as u32,
            height: values[3] as u32,
        };

        let operation = match kind {
            OperationKind::LogTransform => Operation::LogTransform,
            OperationKind::GaussianBlur => Operation::GaussianBlur {
                ksize: (values[0] as u32) | 1,
            },
            OperationKind::Median => Operation::Median,
            OperationKind::Averaging => Operation::Averaging,
            OperationKind::DifferenceFilters => Operation::DifferenceFilters,
            OperationKind::Sharpen => Operation::Sharpen {
                amount: values[0] as u32,
            },
            OperationKind::Sobel => Operation::Sobel,
            OperationKind::Canny => {
                let high = values[1] as u8;
                Operation::Canny {
                    low: (values[0] as u8).min(high),
                    high,
                }
            }
            OperationKind::FacesEyes => Operation::FacesEyes,
            OperationKind::HoughCircles => Operation::HoughCircles,
            OperationKind::HoughLines => Operation::HoughLines,
            OperationKind::HarrisCorners => Operation::HarrisCorners,
            OperationKind::GreenBallMask => Operation::GreenBallMask,
            OperationKind::MaskObject => Operation::MaskObject {
                selection: selection(),
            },
            OperationKind::KMeans => Operation::KMeans {
                k: values[0] as u32,
            },
            OperationKind::WatershedAuto => Operation::WatershedAuto,
            OperationKind::WatershedMarkers => {
                return Err(OperationError::InvalidParameter(
                    "watershed markers are painted interactively".to_string(),
                )
                .into());
            }
            OperationKind::MorphBasic => Operation::MorphBasic,
            OperationKind::MorphOpening => Operation::MorphOpening,
            OperationKind::Rotation => Operation::Rotation { degrees: values[0] },
            OperationKind::Translation => Operation::Translation {
                dx: values[0] as i32,
                dy: values[1] as i32,
            },
            OperationKind::Zoom => Operation::Zoom { factor: values[0] },
            OperationKind::Crop => Operation::Crop {
                selection: selection(),
            },
        };
        Ok(operation)
    }

    /// The operation with every field at its default, when that makes sense
    pub fn with_defaults(kind: OperationKind) -> Option<Self> {
        match kind.requirement() {
            Requirement::Tool(_) => None,
            _ => {
                let defaults: Vec<f64> = kind.fields().iter().map(|f| f.default).collect();
                Self::from_values(kind, &defaults).ok()
            }
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::LogTransform => OperationKind::LogTransform,
            Operation::GaussianBlur { .. } => OperationKind::GaussianBlur,
            Operation::Median => OperationKind::Median,
            Operation::Averaging => OperationKind::Averaging,
            Operation::DifferenceFilters => OperationKind::DifferenceFilters,
            Operation::Sharpen { .. } => OperationKind::Sharpen,
            Operation::Sobel => OperationKind::Sobel,
            Operation::Canny { .. } => OperationKind::Canny,
            Operation::FacesEyes => OperationKind::FacesEyes,
            Operation::HoughCircles => OperationKind::HoughCircles,
            Operation::HoughLines => OperationKind::HoughLines,
            Operation::HarrisCorners => OperationKind::HarrisCorners,
            Operation::GreenBallMask => OperationKind::GreenBallMask,
            Operation::MaskObject { .. } => OperationKind::MaskObject,
            Operation::KMeans { .. } => OperationKind::KMeans,
            Operation::WatershedAuto => OperationKind::WatershedAuto,
            Operation::WatershedMarkers { .. } => OperationKind::WatershedMarkers,
            Operation::MorphBasic => OperationKind::MorphBasic,
            Operation::MorphOpening => OperationKind::MorphOpening,
            Operation::Rotation { .. } => OperationKind::Rotation,
            Operation::Translation { .. } => OperationKind::Translation,
            Operation::Zoom { .. } => OperationKind::Zoom,
            Operation::Crop { .. } => OperationKind::Crop,
        }
    }

    /// Run against the loaded image
    pub fn run(&self, input: &Frame, ctx: &OpContext) -> AppResult<OperationOutput> {
        let kind = self.kind();
        debug!(operation = kind.id(), "Running operation");
        let single = |frame: AppResult<Frame>| frame.map(OperationOutput::Single);

        let output = match self {
            Operation::LogTransform => {
                single(Frame::gray(filters::log_transform(&input.to_gray())))
            }
            Operation::GaussianBlur { ksize } => {
                single(Frame::color(filters::gaussian_blur(&input.to_rgb(), *ksize)))
            }
            Operation::Median => single(Frame::color(filters::median(&input.to_rgb()))),
            Operation::Averaging => single(Frame::color(filters::averaging(&input.to_rgb()))),
            Operation::DifferenceFilters => filters::difference_panels(input),
            Operation::Sharpen { amount } => {
                single(Frame::color(filters::sharpen(&input.to_rgb(), *amount)))
            }
            Operation::Sobel => edges::sobel_panels(input),
            Operation::Canny { low, high } => {
                single(Frame::gray(edges::canny(&input.to_gray(), *low, *high)))
            }
            Operation::FacesEyes => {
                single(features::faces_and_eyes(&input.to_rgb(), ctx).and_then(Frame::color))
            }
            Operation::HoughCircles => {
                single(Frame::color(features::hough_circles(&input.to_rgb())))
            }
            Operation::HoughLines => features::hough_line_panels(input),
            Operation::HarrisCorners => {
                single(Frame::color(features::harris_corners(&input.to_rgb())))
            }
            Operation::GreenBallMask => {
                single(Frame::color(features::green_ball_mask(&input.to_rgb())))
            }
            Operation::MaskObject { selection } => single(
                segment::mask_object(&input.to_rgb(), *selection).and_then(Frame::color),
            ),
            Operation::KMeans { k } => single(Frame::color(segment::kmeans(&input.to_rgb(), *k))),
            Operation::WatershedAuto => {
                single(Frame::color(segment::watershed_auto(&input.to_rgb())))
            }
            Operation::WatershedMarkers { markers } => single(
                segment::watershed_markers(&input.to_rgb(), markers).and_then(Frame::color),
            ),
            Operation::MorphBasic => morphology::basic_panels(input),
            Operation::MorphOpening => morphology::opening_panels(input),
            Operation::Rotation { degrees } => {
                single(Frame::color(geometry::rotate(&input.to_rgb(), *degrees)))
            }
            Operation::Translation { dx, dy } => {
                single(Frame::color(geometry::translate(&input.to_rgb(), *dx, *dy)))
            }
            Operation::Zoom { factor } => {
                single(Frame::color(geometry::zoom(&input.to_rgb(), *factor)))
            }
            Operation::Crop { selection } => {
                single(geometry::crop(&input.to_rgb(), *selection).and_then(Frame::color))
            }
        }?;

        match &output {
            OperationOutput::Single(frame) => info!(
                operation = kind.id(),
                width = frame.width(),
                height = frame.height(),
                "Operation complete"
            ),
            OperationOutput::Panels { panels, note } => info!(
                operation = kind.id(),
                panels = panels.len(),
                note = ?note,
                "Operation produced panels"
            ),
        }
        Ok(output)
    }
}

/// Operations treat a zero-area selection as a cancelled tool
pub(crate) fn require_selection(selection: Selection) -> AppResult<Selection> {
    if selection.is_empty() {
        Err(AppError::Cancelled)
    } else {
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_round_trip() {
        for kind in OperationKind::ALL {
            assert_eq!(OperationKind::from_id(kind.id()), Some(kind));
        }
        let mut ids: Vec<_> = OperationKind::ALL.iter().map(|k| k.id()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), OperationKind::ALL.len());
    }

    #[test]
    fn test_every_kind_has_a_category() {
        let total: usize = OperationCategory::ALL.iter().map(|c| c.kinds().count()).sum();
        assert_eq!(total, OperationKind::ALL.len());
    }

    #[test]
    fn test_prompt_field_validation() {
        let field = KMEANS_FIELDS[0];
        assert_eq!(field.parse(" 8 "), Ok(8.0));
        assert!(field.parse("abc").is_err());
        assert!(field.parse("2.5").is_err());
        assert!(field.parse("1").is_err());
        assert!(field.parse("33").is_err());
    }

    #[test]
    fn test_from_values_normalises_inputs() {
        assert_eq!(
            Operation::from_values(OperationKind::GaussianBlur, &[4.0]).unwrap(),
            Operation::GaussianBlur { ksize: 5 }
        );
        assert_eq!(
            Operation::from_values(OperationKind::Canny, &[220.0, 120.0]).unwrap(),
            Operation::Canny {
                low: 120,
                high: 120
            }
        );
        assert!(Operation::from_values(OperationKind::Zoom, &[0.05]).is_err());
        assert!(Operation::from_values(OperationKind::Translation, &[1.0]).is_err());
    }

    #[test]
    fn test_defaults_exist_for_non_tool_kinds() {
        for kind in OperationKind::ALL {
            let built = Operation::with_defaults(kind);
            match kind.requirement() {
                Requirement::Tool(_) => assert!(built.is_none()),
                _ => assert_eq!(built.map(|op| op.kind()), Some(kind)),
            }
        }
    }
}
