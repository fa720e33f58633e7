// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Stacks, material cache, accumulators and assembler working together the
//! way a traversal handler drives them.

use approx::assert_relative_eq;
use nalgebra::{Matrix4, Point3, Vector3};
use scenebake_core::{
    ElementId, InMemoryDocument, MaterialInfo, PolymeshFacet, PolymeshTopology, Rgb8,
};
use scenebake_geometry::{
    DocumentStack, MaterialCache, MeshAccumulator, SceneAssembler, TransformStack,
};

fn unit_square() -> PolymeshTopology {
    PolymeshTopology::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ],
        vec![PolymeshFacet::new(0, 1, 2), PolymeshFacet::new(0, 2, 3)],
    )
}

fn paint(id: i64, unique_id: &str, transparency: u8) -> MaterialInfo {
    MaterialInfo {
        id: ElementId(id),
        unique_id: unique_id.into(),
        name: unique_id.into(),
        color: Rgb8::new(51, 102, 204),
        transparency,
    }
}

#[test]
fn linked_copies_share_materials_and_bake_transforms() {
    let host = InMemoryDocument::new("Host")
        .with_material(paint(7, "white", 0))
        .into_handle();
    // Same material under a different local id in the linked document
    let linked = InMemoryDocument::new("Linked")
        .with_material(paint(900, "white", 0))
        .with_material(paint(901, "tinted", 32))
        .into_handle();

    let mut transforms = TransformStack::new();
    let mut documents = DocumentStack::new(host);
    let mut materials = MaterialCache::new();
    let mut assembler = SceneAssembler::new("Default");

    // Host element
    let white = materials.resolve(documents.current(), ElementId(7));
    let mut acc = MeshAccumulator::new(ElementId(1));
    acc.add_polymesh(&unit_square(), transforms.current(), white)
        .unwrap();
    assembler.commit(acc);

    // Two placements of the linked document
    for offset in [10.0, 20.0] {
        transforms.push(&Matrix4::new_translation(&Vector3::new(offset, 0.0, 0.0)));
        documents.push(linked.clone());

        let same_white = materials.resolve(documents.current(), ElementId(900));
        let tinted = materials.resolve(documents.current(), ElementId(901));
        assert_eq!(same_white, white);

        let mut acc = MeshAccumulator::new(ElementId(2));
        acc.add_polymesh(&unit_square(), transforms.current(), same_white)
            .unwrap();
        acc.add_polymesh(&unit_square(), transforms.current(), tinted)
            .unwrap();
        assembler.commit(acc);

        documents.pop().unwrap();
        transforms.pop().unwrap();
    }

    assert!(transforms.is_at_root());
    assert!(documents.is_at_root());

    let scene = assembler.finish(&materials);
    assert_eq!(scene.nodes.len(), 3);
    assert_eq!(scene.triangle_count(), 2 + 4 + 4);
    // Default, white, tinted
    assert_eq!(scene.materials.len(), 3);
    assert_eq!(scene.used_materials().len(), 2);

    let tinted = scene.material(scene.nodes[1].mesh.primitives[1].material).unwrap();
    assert_relative_eq!(tinted.base_color[0], 0.2);
    assert_relative_eq!(tinted.base_color[1], 0.4);
    assert_relative_eq!(tinted.base_color[2], 0.8);
    assert_relative_eq!(tinted.base_color[3], 0.75);

    // Second copy sits 20 source units along x, which is output z
    let (min, max) = scene.nodes[2].mesh.primitives[0].bounds().unwrap();
    assert_eq!(min, [0.0, 0.0, 20.0]);
    assert_eq!(max, [1.0, 0.0, 21.0]);
}
