//! Drive a 100k-row grid headlessly: load, sort, scroll, read the window.
//!
//! Run with `cargo run --example virtual_window -p gridline`.

use gridline::{
    ColumnDef, GridConfig, GridEngine, GridError, Record, ScrollAlignment, SortColumn,
};

fn main() -> Result<(), GridError> {
    let columns = vec![
        ColumnDef::new("id", "Id").with_width(80.0),
        ColumnDef::new("dept", "Department"),
        ColumnDef::new("score", "Score"),
    ];
    let mut grid = GridEngine::new(GridConfig::default(), columns);

    let rows: Vec<Record> = (0..100_000i64)
        .map(|i| {
            Record::new()
                .with("id", i)
                .with("dept", format!("dept-{}", i % 23))
                .with("score", (i * 37) % 1000)
        })
        .collect();
    grid.set_rows(rows)?;

    grid.add_sort_column(SortColumn::descending("score"));
    grid.add_sort_column(SortColumn::ascending("dept"));

    grid.set_viewport_size(640.0, 480.0);
    grid.scroll_to(50_000, 0, ScrollAlignment::Start);

    let window = grid.visible_range();
    println!(
        "{} rows total, materializing rows {}..{} ({} cells)",
        grid.visual_row_count(),
        window.row_start,
        window.row_end,
        window.row_count() * window.col_count(),
    );
    for visual in window.row_start..window.row_end.min(window.row_start + 5) {
        println!(
            "row {visual}: id={} dept={} score={}",
            grid.value_at(visual, 0),
            grid.value_at(visual, 1),
            grid.value_at(visual, 2),
        );
    }
    Ok(())
}
