use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageOrigin {
    Camera,
    Gallery,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoxReport {
    pub left: f32,
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub confidence: f32,
    // "Fresh" | "Non-Fresh"; absent when no classifier ran
    pub label: Option<String>,
    pub classifier_score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionReport {
    pub image_width: u32,
    pub image_height: u32,
    pub origin: ImageOrigin,
    pub orientation_degrees: u32,
    pub boxes: Vec<BoxReport>,
    pub summary: String,
}

impl DetectionReport {
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    pub fn count_label(&self, label: &str) -> usize {
        self.boxes.iter().filter(|b| b.label.as_deref() == Some(label)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_lowercase_origin_and_null_label() {
        let report = DetectionReport {
            image_width: 416,
            image_height: 416,
            origin: ImageOrigin::Camera,
            orientation_degrees: 90,
            boxes: vec![BoxReport {
                left: 1.0,
                top: 2.0,
                right: 3.0,
                bottom: 4.0,
                confidence: 0.5,
                label: None,
                classifier_score: None,
            }],
            summary: "Detected: 1".into(),
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["origin"], "camera");
        assert!(json["boxes"][0]["label"].is_null());

        let back: DetectionReport = serde_json::from_value(json).unwrap();
        assert_eq!(back, report);
        assert_eq!(back.count_label("Fresh"), 0);
    }
}
