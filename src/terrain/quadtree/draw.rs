// ============================================
// Draw - Рекурсивная отрисовка с отсечением
// ============================================

use ultraviolet::Mat4;

use crate::render::MeshRenderer;
use super::culling::CullResult;
use super::node::{NodeArena, NodeId};

impl<G> NodeArena<G> {
    /// Нарисовать поддерево. Если узел целиком внутри frustum,
    /// его потомки проверку уже не проходят.
    pub(crate) fn draw<R>(&mut self, id: NodeId, renderer: &mut R, view_proj: &Mat4, check_cull: bool)
    where
        R: MeshRenderer<G> + ?Sized,
    {
        let node = self.node_mut(id);
        node.drawn = false;

        let mut cull = CullResult::Inside;
        if check_cull {
            cull = node.try_cull(view_proj);
            if cull == CullResult::Outside {
                return;
            }
        }

        node.drawn = true;
        if let Some(leaf) = &node.leaf {
            renderer.draw_mesh(&leaf.mesh);
        }

        let children = node.children;
        for child in children.into_iter().flatten() {
            self.draw(child, renderer, view_proj, cull == CullResult::Partial);
        }
    }

    /// Узлы, нарисованные в последнем кадре (обход сверху вниз,
    /// поддерево не нарисованного узла пропускается)
    pub(crate) fn drawn_nodes(&self) -> Vec<NodeId> {
        let mut drawn = Vec::new();
        if self.is_empty() {
            return drawn;
        }

        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            if !node.drawn {
                continue;
            }
            drawn.push(id);
            // Обратный порядок, чтобы NW снимался со стека первым
            stack.extend(node.children.iter().rev().flatten());
        }
        drawn
    }
}
