use recipegraph_core::{Action, EntityId, Equipment, GraphConfig, Ingredient, RecipeSession};
use recipegraph_graph::{
    DependencyGraph, EdgeKind, GraphBuilder, LayoutParams, NodeKind, Theme, HINT_TEXT,
};

fn linked_session() -> RecipeSession {
    let flour = Ingredient::new("flour", Some(2.0), Some("cups".into()), vec![]).unwrap();
    let salt = Ingredient::new("salt", None, None, vec!["kosher".into()]).unwrap();
    let bowl = Equipment::new("large mixing bowl", true, None).unwrap();
    let oven = Equipment::new("oven", true, None).unwrap();

    let mix = Action::new(
        "mix",
        vec![flour.id.clone(), salt.id.clone()],
        Some(bowl.id.clone()),
    )
    .unwrap();
    let bake = Action::new("bake", vec![], Some(oven.id.clone())).unwrap();

    RecipeSession::from_parts(
        "Mix the flour and salt in a large mixing bowl. Bake.",
        vec![flour, salt],
        vec![bowl, oven],
        vec![],
        vec![mix, bake],
    )
}

fn build(session: &RecipeSession) -> DependencyGraph {
    GraphBuilder::new(Theme::light(), LayoutParams::default()).build(session)
}

#[test]
fn test_nodes_in_ingredient_equipment_action_order() {
    let graph = build(&linked_session());

    let kinds: Vec<NodeKind> = graph.nodes.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Ingredient,
            NodeKind::Ingredient,
            NodeKind::Equipment,
            NodeKind::Equipment,
            NodeKind::Action,
            NodeKind::Action,
        ]
    );
    assert!(graph
        .nodes_of(NodeKind::Action)
        .all(|n| n.id.starts_with("action_")));
    assert!(graph.show_legend);
}

#[test]
fn test_edges_follow_links() {
    let session = linked_session();
    let graph = build(&session);

    assert_eq!(graph.edges_of(EdgeKind::IngredientToAction).count(), 2);
    assert_eq!(graph.edges_of(EdgeKind::ActionToEquipment).count(), 2);

    let mix_node = format!("action_{}", session.actions()[0].id);
    let flour_id = session.ingredients()[0].id.to_string();
    assert!(graph
        .edges
        .iter()
        .any(|e| e.source == flour_id && e.target == mix_node));
    for edge in &graph.edges {
        assert!(graph.node(&edge.source).is_some());
        assert!(graph.node(&edge.target).is_some());
    }
}

#[test]
fn test_node_styles_come_from_theme() {
    let theme = Theme::dark();
    let graph = GraphBuilder::new(theme.clone(), LayoutParams::default()).build(&linked_session());

    for node in &graph.nodes {
        assert_eq!(node.color, theme.color_for(node.kind));
        assert_eq!(node.size, node.kind.size());
        assert_eq!(node.symbol, node.kind.symbol());
    }
    let flour = &graph.nodes[0];
    assert_eq!(flour.hover_text, "<b>flour</b><br>Amount: 2 cups");
}

#[test]
fn test_dangling_references_produce_no_edges() {
    let flour = Ingredient::new("flour", None, None, vec![]).unwrap();
    let stir = Action::new(
        "stir",
        vec![flour.id.clone(), EntityId::from("ghost")],
        Some(EntityId::from("missing-pan")),
    )
    .unwrap();
    let session = RecipeSession::from_parts("Stir.", vec![flour], vec![], vec![], vec![stir]);

    let graph = build(&session);
    assert_eq!(graph.nodes.len(), 2);
    assert_eq!(graph.edges.len(), 1);
    let action = graph.nodes_of(NodeKind::Action).next().unwrap();
    assert!(action.hover_text.contains("Ingredients: flour, Unknown"));
    assert!(action.hover_text.contains("Equipment: Unknown"));
}

#[test]
fn test_hint_annotation_and_groups() {
    let graph = build(&linked_session());

    assert_eq!(graph.annotations.len(), 1);
    assert_eq!(graph.annotations[0].text, HINT_TEXT);
    assert_eq!(graph.annotations[0].font_size, 12);

    let groups = graph.node_groups();
    let names: Vec<&str> = groups.iter().map(|g| g.name).collect();
    assert_eq!(names, vec!["Ingredients", "Actions", "Equipment"]);
    assert_eq!(graph.edge_groups().len(), 2);
}

#[test]
fn test_session_without_actions_is_placeholder() {
    let flour = Ingredient::new("flour", None, None, vec![]).unwrap();
    let session = RecipeSession::from_parts("Flour.", vec![flour], vec![], vec![], vec![]);

    let graph = build(&session);
    assert!(graph.is_placeholder());
    assert_eq!(graph.annotations[0].x, 0.5);
}

#[test]
fn test_positions_are_finite_and_stable() {
    let session = linked_session();
    let builder = GraphBuilder::from_config(&GraphConfig::default());
    let first = builder.build(&session);
    let second = builder.build(&session);

    for (a, b) in first.nodes.iter().zip(&second.nodes) {
        assert!(a.position.x.is_finite() && a.position.y.is_finite());
        assert_eq!(a.position, b.position);
    }
}

#[test]
fn test_graph_serializes_for_renderers() {
    let json = build(&linked_session()).to_json().unwrap();
    assert_eq!(json["title"], "Recipe Dependency Graph");
    assert_eq!(json["nodes"].as_array().unwrap().len(), 6);
    assert_eq!(json["edges"][0]["kind"], "ingredient_to_action");
}
