//! COCO-style export of a page's annotations.
//!
//! Every annotation becomes one COCO annotation (table cells included, right
//! after their table). Boxes carry only a `bbox`; polygons also carry their
//! rings as `segmentation` and the even-odd area of those rings.

use std::path::Path;

use docanno_geometry::Point;
use serde::{Deserialize, Serialize};

use crate::error::PageError;
use crate::image_tools::ring_contains;
use crate::model::{Annotation, AnnotationId, BoundType, Category, PageView, category_index};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoDataset {
    pub images: Vec<CocoImage>,
    pub annotations: Vec<CocoAnnotation>,
    pub categories: Vec<CocoCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoImage {
    pub id: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoAnnotation {
    pub id: AnnotationId,
    pub image_id: u32,
    /// 1-based index into the page's category list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u32>,
    pub bbox: [f32; 4],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub segmentation: Vec<Vec<f32>>,
    pub area: f32,
    pub iscrowd: u8,
    /// The annotation's bound type, kept so boxes, text and cells stay apart.
    pub bound_type: BoundType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CocoCategory {
    pub id: u32,
    pub name: String,
    pub supercategory: String,
}

/// Build the COCO dataset for one page.
pub fn export_page(page: &PageView, annotations: &[Annotation]) -> CocoDataset {
    let categories: Vec<CocoCategory> = page
        .categories
        .iter()
        .enumerate()
        .map(|(i, c)| CocoCategory {
            id: i as u32 + 1,
            name: c.name.clone(),
            supercategory: "none".into(),
        })
        .collect();

    let (width, height) = page.size.map_or((0, 0), |s| (s.width, s.height));
    if width == 0 || height == 0 {
        log::warn!("Page {} has no size; exporting without dimensions", page.page_num);
    }

    let mut coco_annotations = Vec::new();
    for annotation in annotations.iter().filter(|a| !a.bound_type.is_link()) {
        coco_annotations.push(convert_annotation(annotation, page.page_num, &page.categories));
        coco_annotations.extend(
            annotation
                .table_cells
                .iter()
                .map(|cell| convert_annotation(cell, page.page_num, &page.categories)),
        );
    }

    log::info!(
        "Exported page {} with {} annotations",
        page.page_num,
        coco_annotations.len()
    );

    CocoDataset {
        images: vec![CocoImage {
            id: page.page_num,
            width,
            height,
        }],
        annotations: coco_annotations,
        categories,
    }
}

/// Export a page and write it to `path` as pretty JSON.
pub fn export_page_to_file(
    page: &PageView,
    annotations: &[Annotation],
    path: &Path,
) -> Result<(), PageError> {
    let json = serde_json::to_string_pretty(&export_page(page, annotations))?;
    std::fs::write(path, json)?;
    log::info!("Wrote COCO export to {:?}", path);
    Ok(())
}

fn convert_annotation(annotation: &Annotation, image_id: u32, categories: &[Category]) -> CocoAnnotation {
    let bound = annotation.bound;
    let area = if annotation.segments.is_empty() {
        bound.area()
    } else {
        segments_area(&annotation.segments)
    };
    let category_id = annotation
        .category
        .as_deref()
        .and_then(|id| category_index(categories, id))
        .map(|i| i as u32 + 1);

    CocoAnnotation {
        id: annotation.id,
        image_id,
        category_id,
        bbox: [bound.x, bound.y, bound.width, bound.height],
        segmentation: annotation.segments.clone(),
        area,
        iscrowd: 0,
        bound_type: annotation.bound_type,
    }
}

/// Area of flat rings under the even-odd rule: rings nested an odd number of
/// times are holes.
pub fn segments_area(segments: &[Vec<f32>]) -> f32 {
    let rings: Vec<Vec<Point>> = segments
        .iter()
        .map(|s| s.chunks_exact(2).map(|xy| Point::new(xy[0], xy[1])).collect())
        .collect();

    rings
        .iter()
        .enumerate()
        .map(|(i, ring)| {
            let depth = ring.first().map_or(0, |first| {
                rings
                    .iter()
                    .enumerate()
                    .filter(|(j, other)| *j != i && ring_contains(other, first))
                    .count()
            });
            let area = polygon_area(ring);
            if depth % 2 == 0 { area } else { -area }
        })
        .sum::<f32>()
        .max(0.0)
}

/// Calculate the area of a polygon using the shoelace formula.
fn polygon_area(vertices: &[Point]) -> f32 {
    if vertices.len() < 3 {
        return 0.0;
    }

    let mut area = 0.0;
    let n = vertices.len();
    for i in 0..n {
        let j = (i + 1) % n;
        area += vertices[i].x * vertices[j].y;
        area -= vertices[j].x * vertices[i].y;
    }
    (area / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellData;
    use docanno_geometry::Bound;

    fn page() -> PageView {
        let mut page = PageView::new(3, 1.0).with_size(200, 100);
        page.categories = vec![
            Category::new("c-1", "Header", "#ff0000"),
            Category::new("c-2", "Figure", "#00ff00"),
        ];
        page
    }

    #[test]
    fn test_box_and_category() {
        let annotations = vec![
            Annotation::new(1, BoundType::Box, Bound::new(10.0, 20.0, 30.0, 40.0)).with_category("c-2"),
        ];
        let coco = export_page(&page(), &annotations);
        assert_eq!(coco.images[0].id, 3);
        assert_eq!(coco.images[0].width, 200);
        assert_eq!(coco.categories.len(), 2);

        let ann = &coco.annotations[0];
        assert_eq!(ann.bbox, [10.0, 20.0, 30.0, 40.0]);
        assert_eq!(ann.category_id, Some(2));
        assert_eq!(ann.area, 1200.0);
        assert!(ann.segmentation.is_empty());
    }

    #[test]
    fn test_polygon_with_hole_area() {
        let mut polygon = Annotation::new(5, BoundType::Polygon, Bound::new(0.0, 0.0, 10.0, 10.0));
        polygon.segments = vec![
            vec![0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 0.0, 10.0],
            vec![2.0, 2.0, 4.0, 2.0, 4.0, 4.0, 2.0, 4.0],
        ];
        let coco = export_page(&page(), &[polygon]);
        assert_eq!(coco.annotations[0].area, 96.0);
        assert_eq!(coco.annotations[0].segmentation.len(), 2);
    }

    #[test]
    fn test_table_cells_follow_table() {
        let mut table = Annotation::new(1, BoundType::Table, Bound::new(0.0, 0.0, 20.0, 10.0));
        table.table_cells = vec![
            Annotation::cell(2, Bound::new(0.0, 0.0, 10.0, 10.0), CellData::new(0, 0)),
            Annotation::cell(3, Bound::new(10.0, 0.0, 10.0, 10.0), CellData::new(0, 1)),
        ];
        let coco = export_page(&page(), &[table]);
        let ids: Vec<AnnotationId> = coco.annotations.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(coco.annotations[2].bound_type, BoundType::TableCell);
    }

    #[test]
    fn test_export_to_file() {
        let path = std::env::temp_dir().join(format!("docanno-coco-{}.json", std::process::id()));
        export_page_to_file(&page(), &[], &path).unwrap();
        let parsed: CocoDataset = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert!(parsed.annotations.is_empty());
        let _ = std::fs::remove_file(&path);
    }
}
