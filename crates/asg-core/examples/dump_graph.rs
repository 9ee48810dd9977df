//! Simple dumper to inspect ASG graph files.

use std::collections::BTreeMap;

use asg_core::{load_from_path, AttrValue, EdgeKind, Factory, LoadOptions, Node, Traversal, Visitor};

struct Printer {
    depth: usize,
    via: Option<&'static str>,
}

impl Printer {
    fn format_attr(factory: &Factory, value: &AttrValue) -> String {
        match *value {
            AttrValue::Bool(b) => format!("{}", b),
            AttrValue::UByte(b) => format!("{}", b),
            AttrValue::UInt(n) => format!("{}", n),
            AttrValue::Str(key) => {
                let s = factory.strings().get(key).unwrap_or("?");
                let preview: String = s.chars().take(40).collect();
                if s.chars().count() > 40 {
                    format!("\"{}...\"", preview)
                } else {
                    format!("\"{}\"", preview)
                }
            }
        }
    }
}

impl Visitor for Printer {
    fn enter(&mut self, factory: &Factory, node: &Node) {
        let layout = node.kind().layout();
        let attrs: Vec<String> = layout
            .attributes
            .iter()
            .zip(node.attributes())
            .filter(|(_, v)| **v != AttrValue::default_for(v.ty()))
            .map(|(d, v)| format!("{}={}", d.name, Self::format_attr(factory, v)))
            .collect();
        let label = self.via.take().map(|e| format!("{}: ", e)).unwrap_or_default();
        println!(
            "{}{}{} #{} {}",
            "  ".repeat(self.depth),
            label,
            node.kind(),
            node.id(),
            attrs.join(" ")
        );
        self.depth += 1;
    }

    fn leave(&mut self, _: &Factory, _: &Node) {
        self.depth -= 1;
    }

    fn edge_enter(&mut self, _: &Factory, _: &Node, edge: EdgeKind, _: &Node) {
        self.via = Some(edge.name());
    }
}

fn main() {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "graph.asg".to_string());

    println!("Reading: {}", path);

    let factory = load_from_path(&path, LoadOptions::new().verify(true)).expect("Failed to load");

    println!("\n=== Graph Info ===");
    println!("Nodes: {}", factory.node_count());
    println!("Next id: {}", factory.next_id());
    println!("Strings: {}", factory.strings().len());

    let mut by_kind: BTreeMap<&'static str, usize> = BTreeMap::new();
    for node in factory.nodes() {
        *by_kind.entry(node.kind().name()).or_default() += 1;
    }
    println!("\n=== Kinds ({}) ===", by_kind.len());
    for (name, count) in &by_kind {
        println!("  {:<40} {}", name, count);
    }

    println!("\n=== Tree ===");
    let mut printer = Printer { depth: 0, via: None };
    Traversal::new()
        .safe(true)
        .run_all(&factory, &mut printer)
        .expect("Failed to traverse");
}
