use crate::types::{Placement, Rect};

const MAX_WIDTH: f64 = 80.0;
const MAX_HEIGHT: f64 = 40.0;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Edge {
    Horizontal,
    Vertical,
}

/// ASCII drawing of one bin, scaled to fit a terminal. Pieces are labelled
/// with their id when there is room, otherwise with their size.
pub fn render_bin(size: Rect, placements: &[Placement]) -> String {
    if size.w == 0 || size.h == 0 {
        return String::new();
    }
    let scale = f64::min(MAX_WIDTH / size.w as f64, MAX_HEIGHT / size.h as f64);
    let to_grid = |v: u32| (v as f64 * scale).round() as usize;
    let grid_w = to_grid(size.w);
    let grid_h = to_grid(size.h);

    if grid_w == 0 || grid_h == 0 {
        return String::new();
    }

    let mut grid = vec![vec![' '; grid_w + 1]; grid_h + 1];
    draw_rect(&mut grid, 0, 0, grid_w, grid_h);

    for p in placements {
        let (sx, sy) = (to_grid(p.x), to_grid(p.y));
        let (sw, sh) = (to_grid(p.rect.w), to_grid(p.rect.h));
        if sw == 0 || sh == 0 {
            continue;
        }
        draw_rect(&mut grid, sx, sy, sw, sh);

        if sw <= 2 || sh < 2 {
            continue;
        }
        let label: Vec<char> = if p.id.chars().count() < sw {
            p.id.chars().collect()
        } else {
            p.rect.to_string().chars().collect()
        };
        let cy = sy + sh / 2;
        let start_x = (sx + sw / 2).saturating_sub(label.len() / 2);
        for (i, &ch) in label.iter().enumerate() {
            let x = start_x + i;
            if x > sx && x < sx + sw && cy < grid.len() && x < grid[cy].len() {
                grid[cy][x] = ch;
            }
        }
    }

    grid.iter()
        .map(|row| {
            let line: String = row.iter().collect();
            format!("{}\n", line.trim_end())
        })
        .collect()
}

fn mark(grid: &mut [Vec<char>], x: usize, y: usize, edge: Edge) {
    let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x)) else {
        return;
    };
    *cell = match (*cell, edge) {
        ('+', _) => '+',
        ('|', Edge::Horizontal) | ('-', Edge::Vertical) => '+',
        (_, Edge::Horizontal) => '-',
        (_, Edge::Vertical) => '|',
    };
}

fn draw_rect(grid: &mut [Vec<char>], x: usize, y: usize, w: usize, h: usize) {
    for i in x..=x + w {
        mark(grid, i, y, Edge::Horizontal);
        mark(grid, i, y + h, Edge::Horizontal);
    }
    for j in y..=y + h {
        mark(grid, x, j, Edge::Vertical);
        mark(grid, x + w, j, Edge::Vertical);
    }
    for (cx, cy) in [(x, y), (x + w, y), (x, y + h), (x + w, y + h)] {
        if let Some(cell) = grid.get_mut(cy).and_then(|row| row.get_mut(cx)) {
            *cell = '+';
        }
    }
}
