//! Table grid: the column and row edges every cell bound derives from.

use docanno_geometry::Bound;

use crate::model::{Annotation, AnnotationId, AnnotationTable, CellData};

/// Column and row edges of a table, outer edges included, in document space.
///
/// A grid with `n` columns has `n + 1` column edges. Cell bounds are read off
/// the grid: `x = col_edges[col]`, `right = col_edges[col + colspan]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableGrid {
    pub col_edges: Vec<f32>,
    pub row_edges: Vec<f32>,
}

impl TableGrid {
    /// Evenly partition `bound` into `rows` x `cols`.
    pub fn uniform(bound: &Bound, rows: usize, cols: usize) -> Self {
        Self {
            col_edges: linear_edges(bound.x, bound.right(), cols.max(1)),
            row_edges: linear_edges(bound.y, bound.bottom(), rows.max(1)),
        }
    }

    /// The grid a table annotation currently describes.
    ///
    /// Interior separators come from the table payload. When those do not
    /// match the extent of the cells (older data without separators), edges
    /// are recovered from the cell bounds instead.
    pub fn from_table(table: &Annotation) -> Self {
        let bound = table.bound;
        let payload = table.table.clone().unwrap_or_default();

        let (rows_needed, cols_needed) = cell_extent(&table.table_cells);
        let cols = if payload.cols.len() + 1 >= cols_needed.max(1) {
            payload.cols
        } else {
            edges_from_cells(&table.table_cells, cols_needed, |c| {
                (c.cell_data().col, c.bound.x)
            })
        };
        let rows = if payload.rows.len() + 1 >= rows_needed.max(1) {
            payload.rows
        } else {
            edges_from_cells(&table.table_cells, rows_needed, |c| {
                (c.cell_data().row, c.bound.y)
            })
        };

        Self {
            col_edges: with_outer(bound.x, cols, bound.right()),
            row_edges: with_outer(bound.y, rows, bound.bottom()),
        }
    }

    pub fn col_count(&self) -> usize {
        self.col_edges.len().saturating_sub(1)
    }

    pub fn row_count(&self) -> usize {
        self.row_edges.len().saturating_sub(1)
    }

    pub fn bound(&self) -> Bound {
        let left = self.col_edges.first().copied().unwrap_or_default();
        let top = self.row_edges.first().copied().unwrap_or_default();
        let right = self.col_edges.last().copied().unwrap_or(left);
        let bottom = self.row_edges.last().copied().unwrap_or(top);
        Bound::new(left, top, right - left, bottom - top)
    }

    /// Bound of a cell placed at `data`; `None` if it falls outside the grid.
    pub fn cell_bound(&self, data: &CellData) -> Option<Bound> {
        let left = *self.col_edges.get(data.col)?;
        let right = *self.col_edges.get(data.col_end())?;
        let top = *self.row_edges.get(data.row)?;
        let bottom = *self.row_edges.get(data.row_end())?;
        Some(Bound::new(left, top, right - left, bottom - top))
    }

    /// Bound covering the grid range `[row_start, row_end) x [col_start, col_end)`.
    pub fn range_bound(
        &self,
        row_start: usize,
        row_end: usize,
        col_start: usize,
        col_end: usize,
    ) -> Option<Bound> {
        let data = CellData::new(row_start, col_start).with_span(
            row_end.saturating_sub(row_start),
            col_end.saturating_sub(col_start),
        );
        self.cell_bound(&data)
    }

    /// Interior separators in the stored table form.
    pub fn to_annotation_table(&self) -> AnnotationTable {
        AnnotationTable {
            rows: interior(&self.row_edges),
            cols: interior(&self.col_edges),
        }
    }

    /// Map every edge proportionally from the current bound onto `bound`.
    pub fn fit_to(&self, bound: &Bound) -> Self {
        let current = self.bound();
        Self {
            col_edges: remap(&self.col_edges, current.x, current.width, bound.x, bound.width),
            row_edges: remap(&self.row_edges, current.y, current.height, bound.y, bound.height),
        }
    }

    /// Resize to `cols` columns.
    ///
    /// Shrinking drops trailing interior edges. Growing splits the last
    /// column evenly to make room.
    pub fn with_col_count(&self, cols: usize) -> Self {
        Self {
            col_edges: resize_edges(&self.col_edges, cols),
            row_edges: self.row_edges.clone(),
        }
    }

    /// Resize to `rows` rows; see [`TableGrid::with_col_count`].
    pub fn with_row_count(&self, rows: usize) -> Self {
        Self {
            col_edges: self.col_edges.clone(),
            row_edges: resize_edges(&self.row_edges, rows),
        }
    }
}

/// Rebuild a table's cells and separators from `grid`.
///
/// Cell bounds are recomputed from the grid; cells that no longer fit are
/// dropped and logged.
pub fn apply_grid(table: &mut Annotation, grid: &TableGrid) {
    table.bound = grid.bound();
    table.table = Some(grid.to_annotation_table());
    let before = table.table_cells.len();
    table.table_cells.retain_mut(|cell| match grid.cell_bound(&cell.cell_data()) {
        Some(bound) => {
            cell.bound = bound;
            true
        }
        None => false,
    });
    if table.table_cells.len() != before {
        log::warn!(
            "Table {}: dropped {} cells outside the grid",
            table.id,
            before - table.table_cells.len()
        );
    }
}

/// Fill every grid square not covered by a cell with a new 1x1 cell.
pub fn fill_uncovered<F>(cells: &mut Vec<Annotation>, grid: &TableGrid, next_id: &mut F)
where
    F: FnMut() -> AnnotationId,
{
    for row in 0..grid.row_count() {
        for col in 0..grid.col_count() {
            let covered = cells.iter().any(|c| c.cell_data().covers(row, col));
            if covered {
                continue;
            }
            let data = CellData::new(row, col);
            if let Some(bound) = grid.cell_bound(&data) {
                cells.push(Annotation::cell(next_id(), bound, data));
            }
        }
    }
}

/// Number of rows and columns spanned by a set of cells.
pub fn cell_extent(cells: &[Annotation]) -> (usize, usize) {
    cells.iter().fold((0, 0), |(rows, cols), cell| {
        let data = cell.cell_data();
        (rows.max(data.row_end()), cols.max(data.col_end()))
    })
}

fn linear_edges(start: f32, end: f32, count: usize) -> Vec<f32> {
    let step = (end - start) / count as f32;
    (0..=count)
        .map(|i| if i == count { end } else { start + step * i as f32 })
        .collect()
}

/// Separators are clamped, not dropped: a collapsed table keeps every
/// separator on its outer edge and so keeps its rows and columns.
fn with_outer(start: f32, interior: Vec<f32>, end: f32) -> Vec<f32> {
    let mut interior: Vec<f32> = interior.into_iter().map(|v| v.max(start).min(end)).collect();
    interior.sort_by(f32::total_cmp);
    let mut edges = Vec::with_capacity(interior.len() + 2);
    edges.push(start);
    edges.extend(interior);
    edges.push(end);
    edges
}

fn interior(edges: &[f32]) -> Vec<f32> {
    if edges.len() <= 2 {
        return Vec::new();
    }
    edges[1..edges.len() - 1].to_vec()
}

/// Interior edges recovered from the leading edge of the cells at each index.
fn edges_from_cells(
    cells: &[Annotation],
    count: usize,
    key: impl Fn(&Annotation) -> (usize, f32),
) -> Vec<f32> {
    (1..count)
        .filter_map(|index| {
            cells
                .iter()
                .map(&key)
                .find(|(i, _)| *i == index)
                .map(|(_, edge)| edge)
        })
        .collect()
}

fn remap(edges: &[f32], from_start: f32, from_len: f32, to_start: f32, to_len: f32) -> Vec<f32> {
    if from_len.abs() < f32::EPSILON {
        return linear_edges(to_start, to_start + to_len, edges.len().saturating_sub(1).max(1));
    }
    edges
        .iter()
        .map(|e| to_start + (e - from_start) / from_len * to_len)
        .collect()
}

fn resize_edges(edges: &[f32], count: usize) -> Vec<f32> {
    let count = count.max(1);
    let current = edges.len().saturating_sub(1);
    let (Some(first), Some(last)) = (edges.first().copied(), edges.last().copied()) else {
        return Vec::new();
    };

    if count == current {
        return edges.to_vec();
    }
    if count < current {
        let mut kept = edges[..count].to_vec();
        kept.push(last);
        return kept;
    }

    // Split the last band evenly into the columns it now has to hold
    let last_start = edges.get(current.saturating_sub(1)).copied().unwrap_or(first);
    let mut grown = edges[..current.saturating_sub(1)].to_vec();
    grown.extend(linear_edges(last_start, last, count - current + 1));
    grown
}
