// SPDX-License-Identifier: MPL-2.0

//! Boosted Haar cascades in the OpenCV XML layout
//!
//! Supports the `opencv-cascade-classifier` storage written by OpenCV 3+
//! (`<stages>`, `<weakClassifiers>`, `<features>`), with upright HAAR features
//! and arbitrary depth trees.

use super::grouping::{Region, group_regions};
use super::integral::IntegralImage;
use image::imageops::{self, FilterType};
use image::GrayImage;
use quick_xml::Reader;
use quick_xml::events::Event;
use std::fmt;
use std::path::Path;
use tracing::debug;

/// OpenCV subtracts this from every stage threshold
const THRESHOLD_EPS: f32 = 1e-5;

/// Errors while reading a cascade file
#[derive(Debug, Clone, PartialEq)]
pub enum CascadeError {
    /// File could not be read
    Io(String),
    /// XML is malformed
    Xml(String),
    /// A required element is missing or has the wrong shape
    Format(String),
    /// The cascade uses features this evaluator does not implement
    Unsupported(String),
}

impl fmt::Display for CascadeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CascadeError::Io(msg) => write!(f, "I/O error: {}", msg),
            CascadeError::Xml(msg) => write!(f, "XML error: {}", msg),
            CascadeError::Format(msg) => write!(f, "Invalid cascade: {}", msg),
            CascadeError::Unsupported(msg) => write!(f, "Unsupported cascade: {}", msg),
        }
    }
}

impl std::error::Error for CascadeError {}

/// Weighted rectangle of a Haar feature, in window coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
struct WeightedRect {
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    weight: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct Feature {
    rects: Vec<WeightedRect>,
}

/// Decision tree node: `value < threshold` goes left, otherwise right.
/// Child indices `<= 0` point into the leaf table (negated).
#[derive(Debug, Clone, Copy, PartialEq)]
struct Node {
    left: i32,
    right: i32,
    feature: usize,
    threshold: f32,
}

#[derive(Debug, Clone, PartialEq)]
struct WeakClassifier {
    nodes: Vec<Node>,
    leaves: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq)]
struct Stage {
    threshold: f32,
    classifiers: Vec<WeakClassifier>,
}

/// Parameters of a multi-scale detection pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectParams {
    /// Pyramid step between scales (> 1)
    pub scale_factor: f32,
    /// Candidates needed for a detection to survive grouping
    pub min_neighbors: usize,
    /// Rectangle grouping tolerance
    pub group_eps: f32,
}

/// A loaded cascade
#[derive(Debug, Clone, PartialEq)]
pub struct Cascade {
    window_width: u32,
    window_height: u32,
    stages: Vec<Stage>,
    features: Vec<Feature>,
}

impl Cascade {
    /// Read a cascade from an XML file
    pub fn load(path: &Path) -> Result<Self, CascadeError> {
        let bytes = std::fs::read(path).map_err(|e| CascadeError::Io(e.to_string()))?;
        Self::from_xml(&bytes)
    }

    /// Parse the XML text of a cascade
    pub fn from_xml(bytes: &[u8]) -> Result<Self, CascadeError> {
        let root = parse_tree(bytes)?;
        let cascade = root
            .find("cascade")
            .ok_or_else(|| CascadeError::Format("missing <cascade> element".into()))?;

        if let Some(kind) = cascade.child("featureType")
            && !kind.text.eq_ignore_ascii_case("HAAR")
        {
            return Err(CascadeError::Unsupported(format!(
                "feature type {}",
                kind.text
            )));
        }

        let window_width = cascade.parse_child::<u32>("width")?;
        let window_height = cascade.parse_child::<u32>("height")?;
        if window_width < 3 || window_height < 3 {
            return Err(CascadeError::Format("window smaller than 3x3".into()));
        }

        let features = cascade
            .child("features")
            .ok_or_else(|| CascadeError::Format("missing <features>".into()))?
            .children
            .iter()
            .map(|node| parse_feature(node, window_width, window_height))
            .collect::<Result<Vec<_>, _>>()?;

        let stages = cascade
            .child("stages")
            .ok_or_else(|| CascadeError::Format("missing <stages>".into()))?
            .children
            .iter()
            .map(|node| parse_stage(node, features.len()))
            .collect::<Result<Vec<_>, _>>()?;

        if stages.is_empty() {
            return Err(CascadeError::Format("cascade has no stages".into()));
        }

        debug!(
            stages = stages.len(),
            features = features.len(),
            window_width,
            window_height,
            "Cascade parsed"
        );

        Ok(Self {
            window_width,
            window_height,
            stages,
            features,
        })
    }

    pub fn window_size(&self) -> (u32, u32) {
        (self.window_width, self.window_height)
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Evaluate the cascade on the window whose top-left corner is `(x, y)`.
    ///
    /// Returns `Ok(())` when every stage accepts, otherwise the index of the
    /// rejecting stage.
    pub fn evaluate(&self, ii: &IntegralImage, x: u32, y: u32) -> Result<(), usize> {
        // Variance normalisation over the window shrunk by one pixel
        let (nw, nh) = (self.window_width - 2, self.window_height - 2);
        let area = (nw * nh) as f64;
        let sum = ii.rect_sum(x + 1, y + 1, nw, nh) as f64;
        let sq_sum = ii.rect_sq_sum(x + 1, y + 1, nw, nh) as f64;
        let nf = area * sq_sum - sum * sum;
        let nf = if nf > 0.0 { nf.sqrt() } else { 1.0 };
        let inv_norm = (1.0 / nf) as f32;

        for (index, stage) in self.stages.iter().enumerate() {
            let mut total = 0.0f32;
            for classifier in &stage.classifiers {
                total += self.eval_tree(classifier, ii, x, y, inv_norm);
            }
            if total < stage.threshold {
                return Err(index);
            }
        }
        Ok(())
    }

    fn eval_tree(
        &self,
        classifier: &WeakClassifier,
        ii: &IntegralImage,
        x: u32,
        y: u32,
        inv_norm: f32,
    ) -> f32 {
        let mut idx = 0i32;
        loop {
            let node = &classifier.nodes[idx as usize];
            let value = self.feature_value(node.feature, ii, x, y) * inv_norm;
            idx = if value < node.threshold {
                node.left
            } else {
                node.right
            };
            if idx <= 0 {
                return classifier.leaves[(-idx) as usize];
            }
        }
    }

    #[inline]
    fn feature_value(&self, feature: usize, ii: &IntegralImage, x: u32, y: u32) -> f32 {
        self.features[feature]
            .rects
            .iter()
            .map(|r| r.weight * ii.rect_sum(x + r.x, y + r.y, r.w, r.h) as f32)
            .sum()
    }

    /// Multi-scale sliding-window detection over an intensity image.
    ///
    /// The image is shrunk by successive powers of `scale_factor` while the
    /// window stays fixed; detections are mapped back to input coordinates
    /// and merged with [`group_regions`].
    pub fn detect(&self, image: &GrayImage, params: &DetectParams) -> Vec<Region> {
        let (img_w, img_h) = image.dimensions();
        let scale_factor = params.scale_factor.max(1.01);
        let mut candidates = Vec::new();
        let mut factor = 1.0f32;

        loop {
            let win_w = (self.window_width as f32 * factor).round() as u32;
            let win_h = (self.window_height as f32 * factor).round() as u32;
            if win_w > img_w || win_h > img_h {
                break;
            }

            let scaled_w = (img_w as f32 / factor).round() as u32;
            let scaled_h = (img_h as f32 / factor).round() as u32;
            if scaled_w < self.window_width || scaled_h < self.window_height {
                break;
            }

            let scaled = if factor == 1.0 {
                image.clone()
            } else {
                imageops::resize(image, scaled_w, scaled_h, FilterType::Triangle)
            };
            let ii = IntegralImage::new(&scaled);
            let step = if factor > 2.0 { 1 } else { 2 };
            let max_x = scaled_w - self.window_width;
            let max_y = scaled_h - self.window_height;

            let mut y = 0;
            while y <= max_y {
                let mut x = 0;
                while x <= max_x {
                    match self.evaluate(&ii, x, y) {
                        Ok(()) => candidates.push(Region {
                            x: (x as f32 * factor).round() as i32,
                            y: (y as f32 * factor).round() as i32,
                            width: win_w as i32,
                            height: win_h as i32,
                        }),
                        // Rejected by the very first stage: skip one extra step
                        Err(0) => x += step,
                        Err(_) => {}
                    }
                    x += step;
                }
                y += step;
            }

            factor *= scale_factor;
        }

        group_regions(candidates, params.min_neighbors, params.group_eps)
    }
}

/// Minimal element tree built from the XML event stream
#[derive(Debug, Default)]
struct XmlNode {
    name: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Depth-first search for the first element with this name
    fn find(&self, name: &str) -> Option<&XmlNode> {
        if self.name == name {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(name))
    }

    fn parse_child<T: std::str::FromStr>(&self, name: &str) -> Result<T, CascadeError> {
        let node = self
            .child(name)
            .ok_or_else(|| CascadeError::Format(format!("missing <{}>", name)))?;
        node.text
            .trim()
            .parse()
            .map_err(|_| CascadeError::Format(format!("<{}> is not a number", name)))
    }

    fn numbers(&self) -> Result<Vec<f64>, CascadeError> {
        self.text
            .split_whitespace()
            .map(|t| {
                t.parse::<f64>().map_err(|_| {
                    CascadeError::Format(format!("bad number '{}' in <{}>", t, self.name))
                })
            })
            .collect()
    }
}

fn parse_tree(bytes: &[u8]) -> Result<XmlNode, CascadeError> {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut stack = vec![XmlNode::default()];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => stack.push(XmlNode {
                name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                ..Default::default()
            }),
            Ok(Event::Empty(ref e)) => {
                let node = XmlNode {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    ..Default::default()
                };
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(node);
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|err| CascadeError::Xml(err.to_string()))?;
                if let Some(current) = stack.last_mut() {
                    if !current.text.is_empty() {
                        current.text.push(' ');
                    }
                    current.text.push_str(text.trim());
                }
            }
            Ok(Event::End(_)) => {
                if stack.len() < 2 {
                    return Err(CascadeError::Xml("unbalanced closing tag".into()));
                }
                if let Some(node) = stack.pop()
                    && let Some(parent) = stack.last_mut()
                {
                    parent.children.push(node);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(CascadeError::Xml(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if stack.len() != 1 {
        return Err(CascadeError::Xml("unexpected end of document".into()));
    }
    stack
        .pop()
        .ok_or_else(|| CascadeError::Xml("empty document".into()))
}

fn parse_feature(node: &XmlNode, win_w: u32, win_h: u32) -> Result<Feature, CascadeError> {
    if let Some(tilted) = node.child("tilted")
        && tilted.text.trim() != "0"
    {
        return Err(CascadeError::Unsupported("tilted features".into()));
    }

    let rects_node = node
        .child("rects")
        .ok_or_else(|| CascadeError::Format("feature without <rects>".into()))?;

    let rects = rects_node
        .children
        .iter()
        .map(|r| {
            let values = r.numbers()?;
            let [x, y, w, h, weight] = values[..] else {
                return Err(CascadeError::Format(format!(
                    "rectangle needs 5 values, got {}",
                    values.len()
                )));
            };
            if x < 0.0 || y < 0.0 || w <= 0.0 || h <= 0.0 {
                return Err(CascadeError::Format("negative rectangle".into()));
            }
            let rect = WeightedRect {
                x: x as u32,
                y: y as u32,
                w: w as u32,
                h: h as u32,
                weight: weight as f32,
            };
            if rect.x + rect.w > win_w || rect.y + rect.h > win_h {
                return Err(CascadeError::Format("rectangle outside the window".into()));
            }
            Ok(rect)
        })
        .collect::<Result<Vec<_>, _>>()?;

    if rects.is_empty() {
        return Err(CascadeError::Format("feature without rectangles".into()));
    }
    Ok(Feature { rects })
}

fn parse_stage(node: &XmlNode, feature_count: usize) -> Result<Stage, CascadeError> {
    let threshold = node.parse_child::<f32>("stageThreshold")? - THRESHOLD_EPS;
    let classifiers = node
        .child("weakClassifiers")
        .ok_or_else(|| CascadeError::Format("stage without <weakClassifiers>".into()))?
        .children
        .iter()
        .map(|c| parse_weak(c, feature_count))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Stage {
        threshold,
        classifiers,
    })
}

fn parse_weak(node: &XmlNode, feature_count: usize) -> Result<WeakClassifier, CascadeError> {
    let internal = node
        .child("internalNodes")
        .ok_or_else(|| CascadeError::Format("classifier without <internalNodes>".into()))?
        .numbers()?;
    let leaves: Vec<f32> = node
        .child("leafValues")
        .ok_or_else(|| CascadeError::Format("classifier without <leafValues>".into()))?
        .numbers()?
        .into_iter()
        .map(|v| v as f32)
        .collect();

    if internal.is_empty() || internal.len() % 4 != 0 {
        return Err(CascadeError::Format(
            "internalNodes must hold groups of 4 values".into(),
        ));
    }

    let nodes = internal
        .chunks_exact(4)
        .map(|chunk| {
            let node = Node {
                left: chunk[0] as i32,
                right: chunk[1] as i32,
                feature: chunk[2] as usize,
                threshold: chunk[3] as f32,
            };
            if node.feature >= feature_count {
                return Err(CascadeError::Format(format!(
                    "feature index {} out of range",
                    node.feature
                )));
            }
            Ok(node)
        })
        .collect::<Result<Vec<_>, _>>()?;

    // Every child index must point at a node or a leaf
    for node in &nodes {
        for child in [node.left, node.right] {
            let ok = if child > 0 {
                (child as usize) < nodes.len()
            } else {
                ((-child) as usize) < leaves.len()
            };
            if !ok {
                return Err(CascadeError::Format("tree child index out of range".into()));
            }
        }
    }

    Ok(WeakClassifier { nodes, leaves })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::Luma;

    /// One stage, one stump on a two-rectangle feature: left half minus right
    /// half of a 6x6 window. Bright-left windows score +1, others -1.
    pub(crate) const EDGE_CASCADE: &str = r#"<?xml version="1.0"?>
<opencv_storage>
<cascade type_id="opencv-cascade-classifier">
  <stageType>BOOST</stageType>
  <featureType>HAAR</featureType>
  <height>6</height>
  <width>6</width>
  <stageNum>1</stageNum>
  <stages>
    <_>
      <maxWeakCount>1</maxWeakCount>
      <stageThreshold>0.</stageThreshold>
      <weakClassifiers>
        <_>
          <internalNodes>
            0 -1 0 1.0000000000000000e-01</internalNodes>
          <leafValues>
            -1. 1.</leafValues></_></weakClassifiers></_></stages>
  <features>
    <_>
      <rects>
        <_>
          0 0 3 6 1.</_>
        <_>
          3 0 3 6 -1.</_></rects></_></features></cascade>
</opencv_storage>
"#;

    #[test]
    fn test_parse_minimal_cascade() {
        let cascade = Cascade::from_xml(EDGE_CASCADE.as_bytes()).unwrap();
        assert_eq!(cascade.window_size(), (6, 6));
        assert_eq!(cascade.stage_count(), 1);
        assert_eq!(cascade.features[0].rects.len(), 2);
        assert_eq!(cascade.stages[0].classifiers[0].leaves, vec![-1.0, 1.0]);
    }

    #[test]
    fn test_evaluate_accepts_matching_window() {
        let cascade = Cascade::from_xml(EDGE_CASCADE.as_bytes()).unwrap();
        // Left half bright, right half dark, with some texture so the variance is non-zero
        let img = GrayImage::from_fn(6, 6, |x, y| {
            Luma([if x < 3 { 200 + (y % 2) as u8 } else { 20 }])
        });
        let ii = IntegralImage::new(&img);
        assert_eq!(cascade.evaluate(&ii, 0, 0), Ok(()));

        let flipped = image::imageops::flip_horizontal(&img);
        let ii = IntegralImage::new(&flipped);
        assert_eq!(cascade.evaluate(&ii, 0, 0), Err(0));
    }

    #[test]
    fn test_rejects_tilted_features() {
        let xml = EDGE_CASCADE.replace(
            "<rects>",
            "<tilted>1</tilted><rects>",
        );
        assert!(matches!(
            Cascade::from_xml(xml.as_bytes()),
            Err(CascadeError::Unsupported(_))
        ));
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(Cascade::from_xml(b"<opencv_storage></opencv_storage>").is_err());
        assert!(Cascade::from_xml(b"not xml at all <<<").is_err());
    }
}
