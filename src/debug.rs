use alloc::{collections::VecDeque, string::String};
use core::{fmt, ptr::NonNull};

use crate::{links, value, Color, Node, RbTree};

impl<T: fmt::Display, C> RbTree<T, C> {
    /// Writes the shape of the tree to `w` as a Graphviz digraph named `name`.
    ///
    /// Each level of the tree is laid out on its own rank. Nodes are labeled with their values and
    /// filled with their colors; missing children are drawn as points.
    pub fn dotgraph<W: fmt::Write>(&self, name: &str, mut w: W) -> fmt::Result {
        let root = match self.root() {
            Some(r) => r,
            None => return write!(w, "digraph \"graph-{name}\" {{}}"),
        };

        enum Item<T> {
            Node(NonNull<Node<T>>, usize),
            Missing(usize),
        }

        let mut queue = VecDeque::new();
        queue.push_back(Item::Node(root, 0));

        write!(
            w,
            "digraph \"graph-{name}\" {{\n subgraph \"subgraph-{name}\" {{\n"
        )?;

        // Values need not be unique as text, so nodes are named by their position in the walk.
        let mut next_id = 1;
        let mut edges = String::new();

        while !queue.is_empty() {
            use fmt::Write;

            write!(w, "{{rank=same; ")?;

            for _ in 0..queue.len() {
                let Some(item) = queue.pop_front() else {
                    break;
                };

                let (node, id) = match item {
                    Item::Node(node, id) => (node, id),
                    Item::Missing(id) => {
                        write!(w, "\"graph{name}-{id}\" [shape=point]; ")?;
                        continue;
                    }
                };

                let node_links = unsafe { links(node) };
                let (fill, font) = match node_links.color() {
                    Color::Red => ("red", "white"),
                    Color::Black => ("black", "white"),
                };
                write!(
                    w,
                    "\"graph{name}-{id}\" [label=\"{}\" style=filled fillcolor={fill} fontcolor={font}]; ",
                    unsafe { value(node) },
                )?;

                for child in [node_links.left(), node_links.right()] {
                    let child_id = next_id;
                    next_id += 1;

                    queue.push_back(match child {
                        Some(child) => Item::Node(child, child_id),
                        None => Item::Missing(child_id),
                    });
                    writeln!(edges, "\"graph{name}-{id}\" -> \"graph{name}-{child_id}\";")?;
                }
            }

            writeln!(w, "}}")?;
        }

        w.write_str(&edges)?;

        w.write_str(" }\n}")
    }
}
