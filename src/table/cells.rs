//! Cell selection, merging and splitting.
//!
//! All checks work on grid placement ([`CellData`]) only; bounds are derived
//! from the grid afterwards. Invalid selections make `can_merge` / `can_split`
//! return `false` and the corresponding operation a no-op.

use docanno_geometry::{Bound, Point};

use super::grid::TableGrid;
use crate::model::{Annotation, AnnotationId, CellData};

/// Half-open grid range `[row_start, row_end) x [col_start, col_end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRange {
    pub row_start: usize,
    pub row_end: usize,
    pub col_start: usize,
    pub col_end: usize,
}

impl CellRange {
    /// Smallest range covering both cells, spans included.
    pub fn spanning(a: &CellData, b: &CellData) -> Self {
        Self {
            row_start: a.row.min(b.row),
            row_end: a.row_end().max(b.row_end()),
            col_start: a.col.min(b.col),
            col_end: a.col_end().max(b.col_end()),
        }
    }

    /// Whether `cell` lies entirely inside the range.
    pub fn contains(&self, cell: &CellData) -> bool {
        cell.row >= self.row_start
            && cell.row_end() <= self.row_end
            && cell.col >= self.col_start
            && cell.col_end() <= self.col_end
    }
}

/// Cells picked by a drag inside a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CellSelection {
    pub table_id: AnnotationId,
    pub range: CellRange,
    /// Selected cell ids, in table order.
    pub cell_ids: Vec<AnnotationId>,
    /// Highlight bound: the grid edges enclosing the range.
    pub bound: Bound,
}

/// The table cell under a document-space point.
pub fn cell_at<'a>(cells: &'a [Annotation], point: &Point) -> Option<&'a Annotation> {
    cells.iter().find(|c| c.bound.contains(point))
}

/// Select the cells between the cell under `start` and the cell under `end`.
///
/// Returns `None` if either point misses every cell.
pub fn select_cells(table: &Annotation, grid: &TableGrid, start: &Point, end: &Point) -> Option<CellSelection> {
    let first = cell_at(&table.table_cells, start)?.cell_data();
    let last = cell_at(&table.table_cells, end)?.cell_data();
    let range = CellRange::spanning(&first, &last);

    let cell_ids = table
        .table_cells
        .iter()
        .filter(|c| range.contains(&c.cell_data()))
        .map(|c| c.id)
        .collect();
    let bound = grid.range_bound(range.row_start, range.row_end, range.col_start, range.col_end)?;

    Some(CellSelection {
        table_id: table.id,
        range,
        cell_ids,
        bound,
    })
}

/// Whether a set of cells tiles a rectangle exactly.
///
/// Sweeps every row of the bounding range and checks that the cells crossing
/// it cover one contiguous, non-overlapping column interval equal to the
/// range's. Then does the same along columns.
pub fn is_rectangular_shape(cells: &[CellData]) -> bool {
    let Some(range) = bounding_range(cells) else {
        return false;
    };

    let rows_ok = (range.row_start..range.row_end).all(|row| {
        let intervals = cells
            .iter()
            .filter(|c| row >= c.row && row < c.row_end())
            .map(|c| (c.col, c.col_end()));
        covers_exactly(intervals, range.col_start, range.col_end)
    });
    let cols_ok = (range.col_start..range.col_end).all(|col| {
        let intervals = cells
            .iter()
            .filter(|c| col >= c.col && col < c.col_end())
            .map(|c| (c.row, c.row_end()));
        covers_exactly(intervals, range.row_start, range.row_end)
    });

    rows_ok && cols_ok
}

pub fn can_merge(cells: &[CellData]) -> bool {
    cells.len() >= 2 && is_rectangular_shape(cells)
}

pub fn can_split(cells: &[CellData]) -> bool {
    cells.iter().any(CellData::has_span) && is_rectangular_shape(cells)
}

/// Merge the cells `ids` of `table` into one.
///
/// The merged cell keeps the id of the first cell (minimal row, then minimal
/// column) and spans to the far corner of the selection. Returns the merged
/// cell's id, or `None` if the selection cannot be merged.
pub fn merge_cells(table: &mut Annotation, grid: &TableGrid, ids: &[AnnotationId]) -> Option<AnnotationId> {
    let selected: Vec<CellData> = table
        .table_cells
        .iter()
        .filter(|c| ids.contains(&c.id))
        .map(Annotation::cell_data)
        .collect();
    if !can_merge(&selected) {
        log::debug!("Table {}: selection of {} cells is not mergeable", table.id, selected.len());
        return None;
    }

    let range = bounding_range(&selected)?;
    let anchor_id = table
        .table_cells
        .iter()
        .filter(|c| ids.contains(&c.id))
        .min_by_key(|c| (c.cell_data().row, c.cell_data().col))
        .map(|c| c.id)?;

    let merged = CellData::new(range.row_start, range.col_start).with_span(
        range.row_end - range.row_start,
        range.col_end - range.col_start,
    );
    let bound = grid.cell_bound(&merged)?;

    table
        .table_cells
        .retain(|c| c.id == anchor_id || !ids.contains(&c.id));
    let anchor = table.table_cells.iter_mut().find(|c| c.id == anchor_id)?;
    anchor.data = Some(merged);
    anchor.bound = bound;

    log::info!(
        "🔗 Table {}: merged {} cells into {} ({}x{})",
        table.id,
        selected.len(),
        anchor_id,
        merged.rowspan,
        merged.colspan
    );
    Some(anchor_id)
}

/// Split every spanned cell among `ids` into 1x1 cells.
///
/// Each spanned cell is cut into column slices along the grid's column edges,
/// then every slice is cut along the row edges. The top-left piece keeps the
/// original id. Returns the ids of all resulting cells, or an empty list if the
/// selection cannot be split.
pub fn split_cells<F>(
    table: &mut Annotation,
    grid: &TableGrid,
    ids: &[AnnotationId],
    next_id: &mut F,
) -> Vec<AnnotationId>
where
    F: FnMut() -> AnnotationId,
{
    let selected: Vec<CellData> = table
        .table_cells
        .iter()
        .filter(|c| ids.contains(&c.id))
        .map(Annotation::cell_data)
        .collect();
    if !can_split(&selected) {
        log::debug!("Table {}: selection is not splittable", table.id);
        return Vec::new();
    }

    let mut result = Vec::new();
    let mut cells = Vec::with_capacity(table.table_cells.len());
    for cell in table.table_cells.drain(..) {
        let data = cell.cell_data();
        if !ids.contains(&cell.id) || !data.has_span() {
            cells.push(cell);
            continue;
        }

        let mut first = Some(cell);
        for col in data.col..data.col_end() {
            let column_slice = CellData::new(data.row, col).with_span(data.rowspan, 1);
            for row in column_slice.row..column_slice.row_end() {
                let piece_data = CellData::new(row, col);
                let Some(bound) = grid.cell_bound(&piece_data) else {
                    continue;
                };
                let piece = match first.take() {
                    Some(mut original) => {
                        original.data = Some(piece_data);
                        original.bound = bound;
                        original
                    }
                    None => Annotation::cell(next_id(), bound, piece_data),
                };
                result.push(piece.id);
                cells.push(piece);
            }
        }
    }
    table.table_cells = cells;

    log::info!("✂️ Table {}: split into {} cells", table.id, result.len());
    result
}

fn bounding_range(cells: &[CellData]) -> Option<CellRange> {
    let first = cells.first()?;
    Some(cells.iter().skip(1).fold(
        CellRange::spanning(first, first),
        |range, c| CellRange {
            row_start: range.row_start.min(c.row),
            row_end: range.row_end.max(c.row_end()),
            col_start: range.col_start.min(c.col),
            col_end: range.col_end.max(c.col_end()),
        },
    ))
}

/// Whether the intervals, laid end to end, cover exactly `[start, end)`.
fn covers_exactly(intervals: impl Iterator<Item = (usize, usize)>, start: usize, end: usize) -> bool {
    let mut intervals: Vec<(usize, usize)> = intervals.collect();
    intervals.sort_unstable();
    let mut cursor = start;
    for (from, to) in intervals {
        if from != cursor {
            return false;
        }
        cursor = to;
    }
    cursor == end
}
