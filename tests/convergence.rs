//! Mesh convergence of the Q4 element against a closed-form bending field
//!
//! A 2 x 1 plate clamped at x = 0 carries a linearly varying traction
//! p(y) = E * 0.12 * (y - 0.5) on its free edge. With nu = 0 the exact
//! displacements are u = 0.12 x (y - 0.5) and v = -0.06 x^2, a quadratic
//! field the bilinear element can only approximate.

use approx::assert_relative_eq;
use stap_fem::prelude::*;

const LENGTH: f64 = 2.0;
const DEPTH: f64 = 1.0;
const E: f64 = 1000.0;
const CURVATURE: f64 = 0.12;

fn node_number(nx: usize, i: usize, j: usize) -> usize {
    j * (nx + 1) + i + 1
}

fn exact(x: f64, y: f64) -> (f64, f64) {
    (CURVATURE * x * (y - 0.5), -0.5 * CURVATURE * x * x)
}

fn traction(y: f64) -> f64 {
    E * CURVATURE * (y - 0.5)
}

/// Plate of `n` x `n` elements with consistent nodal forces on x = LENGTH
fn build_plate(n: usize) -> Domain {
    let mut domain = Domain::planar(&format!("bending plate {n}x{n}"));
    for j in 0..=n {
        let y = DEPTH * j as f64 / n as f64;
        for i in 0..=n {
            let x = LENGTH * i as f64 / n as f64;
            let node = Node::planar(node_number(n, i, j), x, y);
            let node = if i == 0 { node.fixed(&[0, 1]) } else { node };
            domain.add_node(node).unwrap();
        }
    }

    let mut group =
        ElementGroup::new(ElementType::Q4).with_material(Material::plane_stress(E, 0.0, 1.0));
    for j in 0..n {
        for i in 0..n {
            group = group.with_element(
                &[
                    node_number(n, i, j),
                    node_number(n, i + 1, j),
                    node_number(n, i + 1, j + 1),
                    node_number(n, i, j + 1),
                ],
                1,
            );
        }
    }
    domain.add_group(group).unwrap();

    // linear traction integrated exactly over each edge segment
    let mut case = LoadCase::new();
    for j in 0..n {
        let (ya, yb) = (DEPTH * j as f64 / n as f64, DEPTH * (j + 1) as f64 / n as f64);
        let (pa, pb) = (traction(ya), traction(yb));
        let h = yb - ya;
        case.add(ConcentratedLoad::fx(node_number(n, n, j), h * (2.0 * pa + pb) / 6.0));
        case.add(ConcentratedLoad::fx(node_number(n, n, j + 1), h * (pa + 2.0 * pb) / 6.0));
    }
    domain.add_load_case(case).unwrap();
    domain
}

/// Root mean square nodal displacement error over the whole mesh
fn rms_error(n: usize) -> f64 {
    let mut domain = build_plate(n);
    let results = domain.analyze(AnalysisOptions::execute()).unwrap();
    let case = results.load_case(1).unwrap();

    let sum: f64 = domain
        .nodes
        .iter()
        .map(|node| {
            let (x, y) = node.xy();
            let (u, v) = exact(x, y);
            let d = case.displacement(node.number).unwrap().displacement;
            (d[0] - u).powi(2) + (d[1] - v).powi(2)
        })
        .sum();
    (sum / domain.nodes.len() as f64).sqrt()
}

#[test]
fn q4_nodal_error_matches_reference_values() {
    assert_relative_eq!(rms_error(1), 0.1264911064067353, max_relative = 1e-8);
    assert_relative_eq!(rms_error(2), 0.052068331172711216, max_relative = 1e-8);
    assert_relative_eq!(rms_error(4), 0.015308932233107813, max_relative = 1e-8);
}

#[test]
fn q4_nodal_error_converges_quadratically() {
    let meshes = [2, 4, 8, 16];
    let errors: Vec<f64> = meshes.iter().map(|&n| rms_error(n)).collect();

    for pair in errors.windows(2) {
        assert!(pair[1] < pair[0], "error grew under refinement: {:?}", errors);
    }

    // h halves at each step, so log2 of the error ratio is the observed order
    let rates: Vec<f64> = errors.windows(2).map(|p| (p[0] / p[1]).log2()).collect();
    for &rate in &rates[1..] {
        assert!(
            (1.7..=2.3).contains(&rate),
            "expected O(h^2) nodal error, observed rates {:?}",
            rates
        );
    }
    assert_relative_eq!(errors[3], 0.0009425133440489032, max_relative = 1e-6);
}
