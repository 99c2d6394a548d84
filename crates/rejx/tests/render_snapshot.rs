use std::path::PathBuf;

use insta::assert_snapshot;
use rejx::app::ops::{Entry, Operation, Report};
use rejx::domain::model::{ListOutcome, RejectFile};
use rejx::ui::View;
use rejx::ui::render::Presenter;

fn listing(paths: &[&str]) -> Report<ListOutcome> {
    let entries = paths
        .iter()
        .map(|path| Entry {
            reject: RejectFile::from_path(PathBuf::from(path)).expect("reject path"),
            outcome: ListOutcome::Ready {
                hunks: 1,
                original_exists: true,
            },
        })
        .collect();
    Report {
        operation: Operation::List,
        entries,
    }
}

#[test]
fn tree_view_renders() {
    let report = listing(&[
        "a.py.rej",
        "src/b.py.rej",
        "src/pkg/c.py.rej",
        "src/z.rej",
    ]);
    let mut presenter = Presenter::new(Vec::new(), false);
    presenter
        .list_report(&report, View::Tree)
        .expect("render tree");
    let rendered = String::from_utf8(presenter.into_inner()).expect("utf-8");
    assert_snapshot!("tree_view", rendered.trim_end());
}
