//! Row/column layout of a table annotation.

use docanno_geometry::Bound;

use super::grid::{TableGrid, apply_grid, cell_extent, fill_uncovered};
use crate::model::{Annotation, AnnotationId};

/// Lay out `table` as `rows` x `cols`.
///
/// - No cells yet: the bound is partitioned linearly into 1x1 cells.
/// - Cells already tiling `rows` x `cols`: kept as they are.
/// - Otherwise the existing grid is shrunk or grown. Cells starting outside
///   the new grid are removed, spans running past it are collapsed, and new
///   1x1 cells fill whatever is left uncovered.
///
/// Returns `false` (and leaves the table untouched) for a zero-sized request.
pub fn initialize<F>(table: &mut Annotation, rows: usize, cols: usize, next_id: &mut F) -> bool
where
    F: FnMut() -> AnnotationId,
{
    if rows == 0 || cols == 0 {
        log::warn!("Table {}: ignoring {}x{} layout", table.id, rows, cols);
        return false;
    }

    if table.table_cells.is_empty() {
        let grid = TableGrid::uniform(&table.bound, rows, cols);
        let mut cells = Vec::with_capacity(rows * cols);
        fill_uncovered(&mut cells, &grid, next_id);
        table.table_cells = cells;
        apply_grid(table, &grid);
        log::info!("📐 Table {}: laid out {}x{}", table.id, rows, cols);
        return true;
    }

    let current = TableGrid::from_table(table);
    if current.row_count() == rows
        && current.col_count() == cols
        && cell_extent(&table.table_cells) == (rows, cols)
    {
        log::debug!("Table {}: already {}x{}", table.id, rows, cols);
        return true;
    }

    let grid = current.with_row_count(rows).with_col_count(cols);

    table.table_cells.retain(|cell| {
        let data = cell.cell_data();
        data.row < rows && data.col < cols
    });
    for cell in &mut table.table_cells {
        if let Some(data) = cell.data.as_mut() {
            data.rowspan = data.rowspan.min(rows - data.row);
            data.colspan = data.colspan.min(cols - data.col);
        }
    }
    fill_uncovered(&mut table.table_cells, &grid, next_id);
    apply_grid(table, &grid);

    log::info!(
        "📐 Table {}: resized grid {}x{} -> {}x{}",
        table.id,
        current.row_count(),
        current.col_count(),
        rows,
        cols
    );
    true
}

/// Move or resize a table, dragging its grid and cells along proportionally.
pub fn fit_to_bound(table: &mut Annotation, bound: Bound) {
    let grid = TableGrid::from_table(table).fit_to(&bound);
    apply_grid(table, &grid);
}
