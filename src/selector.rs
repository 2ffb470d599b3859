use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::AnnotationError;

static POINTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)(?:^|\s)points\s*=\s*(?:"(?P<double>[^"]*)"|'(?P<single>[^']*)')"#)
        .expect("hardcoded points attribute regex is valid")
});

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Polygon vertices in selector order.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Polygon {
    vertices: Vec<Point>,
}

impl Polygon {
    #[must_use]
    pub fn new(vertices: Vec<Point>) -> Self {
        Self { vertices }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Vertices as `[x, y]` pairs.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<[i32; 2]> {
        self.vertices.iter().map(|point| [point.x, point.y]).collect()
    }
}

/// Extracts the polygon from an SVG selector such as
/// `<svg><polygon points="0,0 10,0 10,10"></polygon></svg>`.
///
/// Coordinates are parsed as floats and truncated toward zero.
pub fn parse_selector(selector: &str) -> Result<Polygon, AnnotationError> {
    let captures = POINTS_RE.captures(selector).ok_or_else(|| {
        AnnotationError::Parse("selector has no quoted points attribute".to_string())
    })?;
    let raw_points = captures
        .name("double")
        .or_else(|| captures.name("single"))
        .map(|value| value.as_str())
        .unwrap_or_default();

    let vertices = raw_points
        .split_whitespace()
        .map(parse_point)
        .collect::<Result<Vec<_>, _>>()?;

    if vertices.is_empty() {
        return Err(AnnotationError::Parse(
            "points attribute is empty".to_string(),
        ));
    }

    Ok(Polygon::new(vertices))
}

fn parse_point(token: &str) -> Result<Point, AnnotationError> {
    let (x, y) = token
        .split_once(',')
        .filter(|(_, y)| !y.contains(','))
        .ok_or_else(|| AnnotationError::Parse(format!("invalid point '{token}', expected x,y")))?;

    Ok(Point::new(parse_coordinate(x, token)?, parse_coordinate(y, token)?))
}

#[allow(clippy::cast_possible_truncation)]
fn parse_coordinate(raw: &str, token: &str) -> Result<i32, AnnotationError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            AnnotationError::Parse(format!("invalid coordinate '{raw}' in point '{token}'"))
        })?
        .trunc();
    if !(f64::from(i32::MIN)..=f64::from(i32::MAX)).contains(&value) {
        return Err(AnnotationError::Parse(format!(
            "coordinate '{raw}' in point '{token}' is out of range"
        )));
    }
    Ok(value as i32)
}

#[cfg(test)]
mod tests {
    use super::{Point, parse_selector};
    use crate::error::AnnotationError;

    #[test]
    fn parses_square_selector() {
        let polygon =
            parse_selector(r#"<svg><polygon points="0,0 10,0 10,10 0,10"></polygon></svg>"#)
                .expect("selector should parse");
        assert_eq!(polygon.to_pairs(), vec![[0, 0], [10, 0], [10, 10], [0, 10]]);
    }

    #[test]
    fn truncates_float_coordinates_and_keeps_order() {
        let polygon = parse_selector(
            "<svg><polygon points='12.9,3.2  40.5,7.99\n25.01,30.7 '></polygon></svg>",
        )
        .expect("selector should parse");
        assert_eq!(
            polygon.vertices(),
            &[Point::new(12, 3), Point::new(40, 7), Point::new(25, 30)]
        );
    }

    #[test]
    fn vertex_count_matches_token_count() {
        let raw = "1,1 2,2 3,3 4,4 5,5 6,6 7,7";
        let selector = format!(r#"<svg><polygon points="{raw}"></polygon></svg>"#);
        let polygon = parse_selector(&selector).expect("selector should parse");
        assert_eq!(polygon.len(), raw.split_whitespace().count());
    }

    #[test]
    fn rejects_missing_points_attribute() {
        let err = parse_selector("<svg><polygon></polygon></svg>").expect_err("should fail");
        assert!(matches!(err, AnnotationError::Parse(_)));
    }

    #[test]
    fn rejects_unquoted_points() {
        let err = parse_selector("<svg><polygon points=0,0></polygon></svg>")
            .expect_err("should fail");
        assert!(matches!(err, AnnotationError::Parse(_)));
    }

    #[test]
    fn rejects_non_numeric_and_unpaired_tokens() {
        let non_numeric = parse_selector(r#"<polygon points="0,0 a,1 2,2">"#)
            .expect_err("non-numeric coordinate should fail");
        assert!(non_numeric.to_string().contains("invalid coordinate 'a'"));

        let unpaired =
            parse_selector(r#"<polygon points="0,0 5 2,2">"#).expect_err("lone value should fail");
        assert!(unpaired.to_string().contains("expected x,y"));

        let triple = parse_selector(r#"<polygon points="0,0,0 1,1 2,2">"#)
            .expect_err("three components should fail");
        assert!(matches!(triple, AnnotationError::Parse(_)));
    }

    #[test]
    fn rejects_empty_point_list() {
        let err = parse_selector(r#"<polygon points="   ">"#).expect_err("should fail");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn ignores_prefixed_points_attributes() {
        let polygon = parse_selector(
            r#"<svg><polygon data-points="9,9 9,9 9,9" points="0,0 10,0 10,10"></polygon></svg>"#,
        )
        .expect("selector should parse");
        assert_eq!(polygon.to_pairs(), vec![[0, 0], [10, 0], [10, 10]]);
    }

    #[test]
    fn rejects_coordinates_outside_pixel_range() {
        let err = parse_selector(r#"<polygon points="0,0 1e20,0 1e20,10 0,10">"#)
            .expect_err("huge coordinate should fail");
        assert!(matches!(err, AnnotationError::Parse(_)));
        assert!(err.to_string().contains("out of range"));
    }
}
