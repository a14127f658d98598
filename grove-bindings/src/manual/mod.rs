// Hand-written extensions on top of the generated classes.

pub mod node;
