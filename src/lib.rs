//! # elemental
//!
//! A retained-mode GUI element tree with a declarative, tab-indented UI
//! description format.
//!
//! Elements live in an arena owned by an [`ElementTree`](element::ElementTree),
//! which also tracks focus, hover, pointer capture, listeners, shared values
//! and running animations. Widgets plug in by implementing
//! [`ElementBehavior`](element::ElementBehavior); rendering goes through a
//! [`Painter`](element::Painter) supplied by the host.
//!
//! ## Core Systems
//!
//! - **[`parser`]**: streaming text parser, escapes and the [`Node`](parser::Node) tree
//! - **[`value`]**: dynamically typed values with lossy coercions
//! - **[`element`]**: the element tree: structure, layout, focus, input, paint
//! - **[`event`]**: events, element listeners and weak element pointers
//! - **[`animation`]**: time-driven animations and the form fade listener
//! - **[`inflate`]**: building element subtrees from parsed documents
//! - **[`config`]**: timings and thresholds
//! - **[`testing`]**: headless pilot, probe widget and snapshot helpers
//! - **[`geometry`]**, **[`id`]**: points, rects, spacing and hashed ids
//!
//! ## Example
//!
//! ```
//! use elemental::element::ElementTree;
//! use elemental::inflate::InflaterRegistry;
//!
//! let mut tree = ElementTree::new();
//! let root = tree.root();
//! tree.load_data(&InflaterRegistry::new(), root, "Element\n\tid panel\n").unwrap();
//! assert!(tree.get_element_by_id(root, "panel").is_some());
//! ```

// Foundation
pub mod geometry;
pub mod id;
pub mod value;

// Declarative format
pub mod parser;

// Element tree
pub mod element;
pub mod event;

// Time and construction
pub mod animation;
pub mod config;
pub mod inflate;

// Headless driving and assertions
pub mod testing;
