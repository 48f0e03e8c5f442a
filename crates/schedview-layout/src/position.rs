//! Date and row to pixel mapping for bars and dependency edges

use chrono::NaiveDate;
use schedview_core::{GanttConfig, Task, VisibleRange};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write;

use crate::timeline::TimeRange;

/// Pixel geometry for the chart area
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PositionMapper {
    range_start: NaiveDate,
    day_width: f64,
    row_height: f64,
    elbow: f64,
}

/// Horizontal placement of one task bar
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BarGeometry {
    pub task_id: String,
    /// Index of the task in the full sequence
    pub row: usize,
    pub x: f64,
    pub width: f64,
    pub progress_width: f64,
}

/// Finish-to-start connector from a predecessor row to a successor row
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EdgePath {
    pub from_id: String,
    pub to_id: String,
    pub from_row: usize,
    pub to_row: usize,
    /// Start, elbow top, elbow bottom, end
    pub points: [(f64, f64); 4],
}

impl EdgePath {
    /// `M x y L x y L x y L x y`
    pub fn to_svg_path(&self) -> String {
        let mut d = String::new();
        for (i, (x, y)) in self.points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            if i > 0 {
                d.push(' ');
            }
            let _ = write!(d, "{cmd} {x} {y}");
        }
        d
    }
}

impl PositionMapper {
    pub fn new(range: &TimeRange, gantt: &GanttConfig) -> Self {
        Self {
            range_start: range.start,
            day_width: gantt.day_width,
            row_height: gantt.row_height,
            elbow: gantt.edge_elbow,
        }
    }

    /// Left edge of the day column holding `date`
    pub fn offset(&self, date: NaiveDate) -> f64 {
        (date - self.range_start).num_days() as f64 * self.day_width
    }

    /// Vertical center of a row
    pub fn row_center(&self, row: usize) -> f64 {
        (row as f64 + 0.5) * self.row_height
    }

    /// Bar for a dated task; at least one day wide
    pub fn bar(&self, task: &Task, row: usize) -> Option<BarGeometry> {
        let (start, end) = (task.start_date?, task.end_date?);
        let x = self.offset(start);
        let width = (self.offset(end) - x + self.day_width).max(self.day_width);
        Some(BarGeometry {
            task_id: task.id.clone(),
            row,
            x,
            width,
            progress_width: width * task.percent_complete / 100.0,
        })
    }

    /// Connector from predecessor `from` (row `from_row`) to successor `to`
    pub fn edge(&self, from: &Task, from_row: usize, to: &Task, to_row: usize) -> Option<EdgePath> {
        let from_x = self.offset(from.end_date?) + self.day_width;
        let to_x = self.offset(to.start_date?);
        let from_y = self.row_center(from_row);
        let to_y = self.row_center(to_row);
        let mid_x = from_x + self.elbow;

        Some(EdgePath {
            from_id: from.id.clone(),
            to_id: to.id.clone(),
            from_row,
            to_row,
            points: [(from_x, from_y), (mid_x, from_y), (mid_x, to_y), (to_x, to_y)],
        })
    }

    /// Bars for the tasks inside `window`
    pub fn bars_for(&self, tasks: &[Task], window: VisibleRange) -> Vec<BarGeometry> {
        let end = window.end.min(tasks.len());
        let start = window.start.min(end);
        (start..end)
            .filter_map(|row| self.bar(&tasks[row], row))
            .collect()
    }

    /// Edges with at least one endpoint inside `window`, ordered by
    /// successor row and then dependency order
    ///
    /// Only rows inside the window are visited.
    pub fn edges_for(&self, tasks: &[Task], index: &EdgeIndex, window: VisibleRange) -> Vec<EdgePath> {
        let end = window.end.min(tasks.len()).min(index.len());
        let start = window.start.min(end);
        let window = VisibleRange::new(start, end);

        // (successor row, slot in its dependency list, predecessor row)
        let mut links: Vec<(usize, usize, usize)> = Vec::new();
        for row in start..end {
            links.extend(
                index.predecessors[row]
                    .iter()
                    .enumerate()
                    .map(|(slot, &from_row)| (row, slot, from_row)),
            );
            links.extend(
                index.successors[row]
                    .iter()
                    .filter(|(to_row, _)| !window.contains(*to_row))
                    .map(|&(to_row, slot)| (to_row, slot, row)),
            );
        }
        links.sort_unstable();

        links
            .into_iter()
            .filter_map(|(to_row, _, from_row)| {
                let from = tasks.get(from_row)?;
                let to = tasks.get(to_row)?;
                self.edge(from, from_row, to, to_row)
            })
            .collect()
    }
}

/// Dependency links resolved to row numbers, built once per dataset
///
/// A dependency id resolves to the last row carrying it; unknown ids are
/// dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EdgeIndex {
    /// Predecessor rows of each row, in dependency order
    predecessors: Vec<Vec<usize>>,
    /// Successor rows of each row, with the slot the link occupies in the
    /// successor's predecessor list
    successors: Vec<Vec<(usize, usize)>>,
}

impl EdgeIndex {
    pub fn build(tasks: &[Task]) -> Self {
        let rows: HashMap<&str, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.as_str(), i))
            .collect();

        let mut predecessors = vec![Vec::new(); tasks.len()];
        let mut successors = vec![Vec::new(); tasks.len()];
        for (to_row, task) in tasks.iter().enumerate() {
            for dep in &task.dependencies {
                if let Some(&from_row) = rows.get(dep.as_str()) {
                    successors[from_row].push((to_row, predecessors[to_row].len()));
                    predecessors[to_row].push(from_row);
                }
            }
        }
        Self {
            predecessors,
            successors,
        }
    }

    /// Rows covered
    pub fn len(&self) -> usize {
        self.predecessors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predecessors.is_empty()
    }

    /// Resolved links
    pub fn link_count(&self) -> usize {
        self.predecessors.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn mapper() -> PositionMapper {
        let range = TimeRange::new(date(2024, 3, 1), date(2024, 4, 1));
        PositionMapper::new(&range, &GanttConfig::default())
    }

    #[test]
    fn offset_is_zero_at_range_start_and_monotonic() {
        let m = mapper();
        assert_eq!(m.offset(date(2024, 3, 1)), 0.0);
        assert_eq!(m.offset(date(2024, 3, 2)), 30.0);

        let mut last = f64::MIN;
        for date in date(2024, 3, 1).iter_days().take(40) {
            let x = m.offset(date);
            assert!(x >= last);
            last = x;
        }
    }

    #[test]
    fn bar_spans_inclusive_days() {
        let task = Task::new("1")
            .dates(Some(date(2024, 3, 3)), Some(date(2024, 3, 5)))
            .complete(50.0);
        let bar = mapper().bar(&task, 0).unwrap();

        assert_eq!(bar.x, 60.0);
        assert_eq!(bar.width, 90.0);
        assert_eq!(bar.progress_width, 45.0);
    }

    #[test]
    fn bar_is_at_least_one_day_wide() {
        let same_day = Task::new("1").dates(Some(date(2024, 3, 3)), Some(date(2024, 3, 3)));
        let inverted = Task::new("2").dates(Some(date(2024, 3, 9)), Some(date(2024, 3, 3)));
        assert_eq!(mapper().bar(&same_day, 0).unwrap().width, 30.0);
        assert_eq!(mapper().bar(&inverted, 1).unwrap().width, 30.0);
    }

    #[test]
    fn undated_task_has_no_bar() {
        let task = Task::new("1").dates(Some(date(2024, 3, 3)), None);
        assert!(mapper().bar(&task, 0).is_none());
    }

    #[test]
    fn edge_route_has_fixed_elbow() {
        let a = Task::new("1").dates(Some(date(2024, 3, 1)), Some(date(2024, 3, 2)));
        let b = Task::new("2").dates(Some(date(2024, 3, 6)), Some(date(2024, 3, 8)));
        let edge = mapper().edge(&a, 0, &b, 2).unwrap();

        assert_eq!(
            edge.points,
            [(60.0, 20.0), (80.0, 20.0), (80.0, 100.0), (150.0, 100.0)]
        );
        assert_eq!(edge.to_svg_path(), "M 60 20 L 80 20 L 80 100 L 150 100");
    }

    #[test]
    fn edge_needs_predecessor_end_and_successor_start() {
        let a = Task::new("1").dates(Some(date(2024, 3, 1)), None);
        let b = Task::new("2").dates(Some(date(2024, 3, 6)), Some(date(2024, 3, 8)));
        assert!(mapper().edge(&a, 0, &b, 1).is_none());
        assert!(mapper().edge(&b, 1, &a, 0).is_some());
    }

    #[test]
    fn window_limits_bars_and_edges() {
        let d = |day| Some(date(2024, 3, day));
        let mut tasks: Vec<Task> = (0..6)
            .map(|i| Task::new(i.to_string()).dates(d(i + 1), d(i + 2)))
            .collect();
        tasks[5].dependencies.push("0".into());
        tasks[2].dependencies.push("1".into());
        tasks[4].dependencies.push("missing".into());

        let m = mapper();
        let window = VisibleRange::new(1, 3);

        let rows: Vec<usize> = m.bars_for(&tasks, window).iter().map(|b| b.row).collect();
        assert_eq!(rows, vec![1, 2]);

        let index = EdgeIndex::build(&tasks);
        assert_eq!(index.link_count(), 2);

        let edges = m.edges_for(&tasks, &index, window);
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].from_row, edges[0].to_row), (1, 2));

        let all = m.edges_for(&tasks, &index, VisibleRange::new(0, tasks.len()));
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn bars_for_clamps_window() {
        let tasks = vec![Task::new("1").dates(Some(date(2024, 3, 1)), Some(date(2024, 3, 1)))];
        assert_eq!(mapper().bars_for(&tasks, VisibleRange::new(0, 50)).len(), 1);
        assert!(mapper().bars_for(&tasks, VisibleRange::new(5, 50)).is_empty());
    }

    // =========================================================================
    // Edge index
    // =========================================================================

    /// Edges for a window of a long chain, compared against every link
    /// filtered by endpoint
    #[test]
    fn windowed_edges_match_full_scan() {
        let tasks: Vec<Task> = (0..500usize)
            .map(|i| {
                let mut task = Task::new(i.to_string())
                    .dates(Some(date(2024, 3, 1 + (i % 20) as u32)), Some(date(2024, 3, 2 + (i % 20) as u32)));
                if i > 0 {
                    task.dependencies.push((i - 1).to_string());
                }
                if i >= 300 {
                    task.dependencies.push("5".into());
                }
                task
            })
            .collect();
        let index = EdgeIndex::build(&tasks);
        let m = mapper();
        let window = VisibleRange::new(200, 240);

        let edges = m.edges_for(&tasks, &index, window);
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.from_row, e.to_row)).collect();
        let expected: Vec<(usize, usize)> = (200..=240).map(|to| (to - 1, to)).collect();
        assert_eq!(pairs, expected);

        // predecessor inside, successors far below
        let head = m.edges_for(&tasks, &index, VisibleRange::new(5, 6));
        assert_eq!(head.len(), 2 + 200);
        assert_eq!((head[0].from_row, head[0].to_row), (4, 5));
        assert_eq!((head[1].from_row, head[1].to_row), (5, 6));
        assert_eq!((head[2].from_row, head[2].to_row), (5, 300));
        assert!(head[2..].iter().all(|e| e.from_row == 5));
    }

    #[test]
    fn duplicate_ids_resolve_to_last_row() {
        let d = |day| Some(date(2024, 3, day));
        let mut tasks = vec![
            Task::new("1").dates(d(1), d(2)),
            Task::new("1").dates(d(3), d(4)),
            Task::new("2").dates(d(5), d(6)),
        ];
        tasks[2].dependencies.push("1".into());
        tasks[2].dependencies.push("1".into());
        let index = EdgeIndex::build(&tasks);

        let edges = mapper().edges_for(&tasks, &index, VisibleRange::new(0, 1));
        assert!(edges.is_empty());
        let edges = mapper().edges_for(&tasks, &index, VisibleRange::new(1, 2));
        let pairs: Vec<(usize, usize)> = edges.iter().map(|e| (e.from_row, e.to_row)).collect();
        assert_eq!(pairs, vec![(1, 2), (1, 2)]);
    }

    #[test]
    fn self_dependency_is_drawn_once() {
        let mut tasks = vec![Task::new("1").dates(Some(date(2024, 3, 1)), Some(date(2024, 3, 2)))];
        tasks[0].dependencies.push("1".into());
        let index = EdgeIndex::build(&tasks);
        assert_eq!(mapper().edges_for(&tasks, &index, VisibleRange::new(0, 1)).len(), 1);
    }
}
