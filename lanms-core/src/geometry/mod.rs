pub mod polygon;

pub use polygon::{
    Polygon, compute_intersection, inside_edge, intersection_over_union, polygon_area,
    polygon_intersection,
};
