//! Árbol de operadores de un proceso, una línea por operador o unidad.

use op_core::{Graph, OperatorId, Process, UnitId};

pub fn describe(process: &Process) -> String {
    let mut out = String::new();
    let graph = process.graph();
    out.push_str(&format!("{} (process)\n", process.name()));
    write_unit(graph, process.main_unit(), 1, &mut out);
    out
}

fn write_unit(graph: &Graph, unit: UnitId, depth: usize, out: &mut String) {
    let Ok(u) = graph.unit(unit) else { return };
    out.push_str(&format!("{}[{}]\n", "  ".repeat(depth), u.name()));
    for &op in graph.operators_in(unit) {
        write_operator(graph, op, depth + 1, out);
    }
}

fn write_operator(graph: &Graph, op: OperatorId, depth: usize, out: &mut String) {
    let Ok(node) = graph.operator(op) else { return };
    let connected: Vec<String> = graph.input_ports(op)
                                      .iter()
                                      .filter_map(|p| graph.source_of(*p).map(|src| (src, *p)))
                                      .map(|(src, p)| {
                                          let name = graph.port(p).map_or("?", |p| p.name());
                                          format!("{name} <- {}", graph.port_label(src))
                                      })
                                      .collect();
    out.push_str(&format!("{}{} ({})", "  ".repeat(depth), node.name(), node.type_key()));
    if !connected.is_empty() {
        out.push_str(&format!("  {}", connected.join(", ")));
    }
    out.push('\n');
    for &unit in node.units() {
        write_unit(graph, unit, depth + 1, out);
    }
}
