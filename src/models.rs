use serde::{Deserialize, Serialize};

/// Bounding box normalized to [0, 1] relative to the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Scale to pixel coordinates as `(x, y, width, height)`.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> (i32, i32, u32, u32) {
        let w = image_width as f32;
        let h = image_height as f32;
        let x = (self.xmin * w).floor() as i32;
        let y = (self.ymin * h).floor() as i32;
        let width = (self.width() * w).ceil().max(1.0) as u32;
        let height = (self.height() * h).ceil().max(1.0) as u32;
        (x, y, width, height)
    }
}

/// One object reported by a detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class_name: String,
    pub score: f32,
    #[serde(rename = "box")]
    pub bbox: BoundingBox,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectCount {
    pub object_class: String,
    pub count: u64,
}

impl ObjectCount {
    pub fn new(object_class: impl Into<String>, count: u64) -> Self {
        Self {
            object_class: object_class.into(),
            count,
        }
    }
}

/// Result of one counting request: this request's tally and the running totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountResponse {
    pub current_objects: Vec<ObjectCount>,
    pub total_objects: Vec<ObjectCount>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_response_json_shape() {
        let response = CountResponse {
            current_objects: vec![ObjectCount::new("cat", 2)],
            total_objects: vec![ObjectCount::new("cat", 5), ObjectCount::new("dog", 1)],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "current_objects": [{"object_class": "cat", "count": 2}],
                "total_objects": [
                    {"object_class": "cat", "count": 5},
                    {"object_class": "dog", "count": 1}
                ]
            })
        );
    }

    #[test]
    fn test_bbox_to_pixels() {
        let bbox = BoundingBox {
            xmin: 0.25,
            ymin: 0.5,
            xmax: 0.75,
            ymax: 1.0,
        };
        assert_eq!(bbox.to_pixels(100, 40), (25, 20, 50, 20));
    }

    #[test]
    fn test_degenerate_bbox_keeps_one_pixel() {
        let bbox = BoundingBox {
            xmin: 0.5,
            ymin: 0.5,
            xmax: 0.5,
            ymax: 0.5,
        };
        let (_, _, w, h) = bbox.to_pixels(10, 10);
        assert_eq!((w, h), (1, 1));
    }
}
