//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use elementtree::Element;
use std::fs::File;
use std::io;
use std::io::BufReader;

fn read_xml(fname: &str) -> Result<Element, io::Error> {
    let file = File::open(fname)?;
    let mut reader = BufReader::new(file);
    Element::from_reader(&mut reader).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

fn is_checked(node: &Element) -> bool {
    node.get_attr("checked") == Some("Qt::Checked")
}

/// Layers of a group which are checked, together with all their parent groups
fn collect_visible(group: &Element, layers: &mut Vec<String>) {
    for node in group.children() {
        match node.tag().name() {
            "layer-tree-layer" if is_checked(node) => {
                if let Some(name) = node.get_attr("name") {
                    layers.push(name.to_string());
                }
            }
            "layer-tree-group" if is_checked(node) => collect_visible(node, layers),
            _ => {}
        }
    }
}

/// Visible layers of a parsed QGIS project, bottom layer first
pub fn visible_layers(root: &Element) -> Result<Vec<String>, String> {
    let tree = root
        .find("layer-tree-group")
        .ok_or("Invalid or empty QGIS Project file".to_string())?;
    let mut layers = Vec::new();
    collect_visible(tree, &mut layers);
    // The layer tree lists the topmost layer first
    layers.reverse();
    Ok(layers)
}

/// Visible layers of a QGIS project file (.qgs)
pub fn read_visible_layers(fname: &str) -> Result<Vec<String>, String> {
    let root = read_xml(fname).map_err(|e| format!("Error reading {}: {}", fname, e))?;
    visible_layers(&root).map_err(|e| format!("{} - {}", fname, e))
}
