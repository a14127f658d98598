// Typed scene-tree queries over `Node.get_children`.

use grove_runtime::{Gd, GodotClass, GroveResult};

use crate::classes::NodeExt;

pub trait NodeTreeExt: NodeExt {
    /// Direct children that are `T` or derive from it, in tree order.
    fn children_of<T: GodotClass>(&self) -> GroveResult<Vec<Gd<T>>> {
        let children = self.get_children(None)?;
        Ok(children
            .into_iter()
            .flatten()
            .filter_map(|child| child.cast::<T>().ok())
            .collect())
    }

    /// First direct child that is a `T`.
    fn first_child_of<T: GodotClass>(&self) -> GroveResult<Option<Gd<T>>> {
        Ok(self.children_of::<T>()?.into_iter().next())
    }
}

impl<N: NodeExt> NodeTreeExt for N {}
