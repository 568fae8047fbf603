//! End-to-end runs over files on disk.

use std::fs;
use std::path::Path;

use vantage::camera::{self, Camera};
use vantage::config::Config;
use vantage::error::{Error, Result};
use vantage::io;
use vantage::pipeline::{Batch, RenderSource};
use vantage::render::{RenderJob, Renderer};

const CUBE_OBJ: &str = "\
o cube
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
v 0 0 1
v 1 0 1
v 0 1 1
v 1 1 1
f 1 3 4 2
f 5 6 8 7
f 1 2 6 5
f 3 7 8 4
f 1 5 7 3
f 2 4 8 6
";

fn write_inputs(dir: &Path, views: &str, keypoints: &str) {
    fs::write(dir.join("cube.obj"), CUBE_OBJ).unwrap();
    fs::write(dir.join("views.txt"), views).unwrap();
    fs::write(dir.join("keypoints.txt"), keypoints).unwrap();
}

/// Writes an empty image, except for one view that always fails.
struct StubRenderer {
    fail_view: Option<usize>,
}

impl Renderer for StubRenderer {
    fn render(&self, job: &RenderJob) -> Result<()> {
        if Some(job.view) == self.fail_view {
            return Err(Error::RenderFailed {
                view: job.view,
                message: "exit status: 1".to_string(),
            });
        }
        if let Some(parent) = job.output.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&job.output, b"")?;
        Ok(())
    }
}

#[test]
fn three_views_give_three_label_files() {
    let dir = tempfile::tempdir().unwrap();
    let explicit = dir.path().join("custom").join("third.txt");
    let views = format!(
        "0 30 0 4\n120 10 -5 3.5\n250 60 12 5 {} {}\n",
        dir.path().join("custom").join("third.png").display(),
        explicit.display()
    );
    write_inputs(dir.path(), &views, "7\n2\n5\n");

    let mesh = io::load_mesh(dir.path().join("cube.obj"), 1.0).unwrap();
    assert_eq!(mesh.num_vertices(), 8);
    assert_eq!(mesh.num_faces(), 12);

    let keypoints = io::read_keypoints(dir.path().join("keypoints.txt")).unwrap();
    let views = io::read_view_file(dir.path().join("views.txt")).unwrap();
    let out = dir.path().join("out");

    let report = Batch::new(Config::default().with_threads(2), &out)
        .with_prefix("cube")
        .run(&mesh, &keypoints, &views, None)
        .unwrap();
    assert!(report.is_success());
    assert_eq!(report.written.len(), 3);

    let labels = [
        out.join("cube_a000_e030_t000_d004.txt"),
        out.join("cube_a120_e010_t005_d004.txt"),
        explicit,
    ];
    // line i belongs to the i-th smallest keypoint id
    let sorted_ids: Vec<_> = keypoints.iter().collect();
    assert_eq!(sorted_ids.iter().map(|v| v.index()).collect::<Vec<_>>(), vec![2, 5, 7]);

    let mut visible = 0;
    for (i, path) in labels.iter().enumerate() {
        assert_eq!(report.written[i].1, *path);
        let camera = Camera::new(
            camera::pose(&views[i].viewpoint).unwrap(),
            &Config::default().camera,
        );

        let text = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3, "{}", path.display());
        for (index, line) in lines.iter().enumerate() {
            let fields: Vec<i64> = line.split(' ').map(|f| f.parse().unwrap()).collect();
            assert_eq!(fields.len(), 3);
            assert_eq!(fields[0], index as i64);
            if (fields[1], fields[2]) == (-1, -1) {
                continue;
            }
            let expected = camera.pixel(&mesh.position(sorted_ids[index]));
            assert_eq!(Some((fields[1], fields[2])), expected, "{} line {}", path.display(), index);
            visible += 1;
        }
    }
    assert!(visible > 0);
}

#[test]
fn cube_from_above_hides_bottom_corners() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), "0 90 0 20\n", "0\n1\n2\n3\n4\n5\n6\n7\n");

    let mesh = io::load_mesh(dir.path().join("cube.obj"), 1.0).unwrap();
    let keypoints = io::read_keypoints(dir.path().join("keypoints.txt")).unwrap();
    let views = io::read_view_file(dir.path().join("views.txt")).unwrap();

    let report = Batch::new(Config::default(), dir.path())
        .run(&mesh, &keypoints, &views, None)
        .unwrap();
    let text = fs::read_to_string(&report.written[0].1).unwrap();

    // canonical ids sort by "x,y,z", so z = 0 corners are the even ids
    for line in text.lines() {
        let fields: Vec<i64> = line.split(' ').map(|f| f.parse().unwrap()).collect();
        let top = mesh.position(vantage::mesh::VertexId::new(fields[0] as usize)).z == 1.0;
        assert_eq!(fields[0] % 2 == 1, top);
        if top {
            assert!(fields[1] >= 0 && fields[2] >= 0, "top corner hidden: '{}'", line);
        } else {
            assert_eq!((fields[1], fields[2]), (-1, -1));
        }
    }
}

#[test]
fn failed_render_writes_no_label() {
    let dir = tempfile::tempdir().unwrap();
    write_inputs(dir.path(), "0 30 0 4\n90 30 0 4\n180 30 0 4\n", "0\n6\n");

    let mesh = io::load_mesh(dir.path().join("cube.obj"), 1.0).unwrap();
    let keypoints = io::read_keypoints(dir.path().join("keypoints.txt")).unwrap();
    let views = io::read_view_file(dir.path().join("views.txt")).unwrap();
    let out = dir.path().join("out");

    let renderer = StubRenderer { fail_view: Some(1) };
    let source = RenderSource {
        renderer: &renderer,
        mesh: dir.path().join("cube.obj"),
        scale: 1.0,
    };
    let report = Batch::new(Config::default(), &out)
        .with_seed(3)
        .run(&mesh, &keypoints, &views, Some(&source))
        .unwrap();

    assert_eq!(report.written.len(), 2);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, 1);
    assert!(matches!(report.failed[0].1, Error::RenderFailed { view: 1, .. }));

    assert!(out.join("view_a000_e030_t000_d004.png").is_file());
    assert!(out.join("view_a000_e030_t000_d004.txt").is_file());
    assert!(!out.join("view_a090_e030_t000_d004.txt").exists());
    assert!(out.join("view_a180_e030_t000_d004.txt").is_file());
}
