use chess::{Piece, Square};

use super::{conclude, delta, is_adjacent, own_piece, require_empty, require_open_or_enemy, used_state};
use crate::board::rules::{in_check, is_square_attacked};
use crate::board::{offset, rank_of};
use crate::error::MoveError;
use crate::game::catalog::AdvantageId;
use crate::game::draft::Draft;
use crate::game::resolver::{AdvantageResolver, MoveIntent, ResolveContext, Resolution};

const NON_KING: [Piece; 5] = [Piece::Pawn, Piece::Knight, Piece::Bishop, Piece::Rook, Piece::Queen];

fn on_back_rank(square: Square) -> bool {
    rank_of(square) == 0 || rank_of(square) == 7
}

/// King moves two squares in a straight line.
pub struct KingsDash;

impl AdvantageResolver for KingsDash {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::KingsDash
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::King])?;
        let (df, dr) = delta(intent.from, intent.to);
        if !matches!((df.abs(), dr.abs()), (2, 0) | (0, 2)) {
            return Err(MoveError::geometry("The king dashes two squares in a straight line"));
        }
        if in_check(ctx.position, color) {
            return Err(MoveError::geometry("The king cannot dash out of check"));
        }
        let middle = offset(intent.from, df / 2, dr / 2)
            .ok_or_else(|| MoveError::geometry("Off-board square"))?;
        require_empty(ctx.position, middle)?;
        if is_square_attacked(ctx.position, middle, !color) {
            return Err(MoveError::geometry(format!("The king cannot dash through {}", middle)));
        }
        require_open_or_enemy(ctx.position, intent.to, color)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// King trades places with an adjacent friendly piece.
pub struct ShadowStep;

impl AdvantageResolver for ShadowStep {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::ShadowStep
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::King])?;
        if !is_adjacent(intent.from, intent.to) {
            return Err(MoveError::geometry("The king can only swap with an adjacent piece"));
        }
        let partner = own_piece(ctx.position, intent.to, color, &NON_KING)
            .map_err(|e| MoveError::geometry(e.to_string()))?;
        if partner == Piece::Pawn && on_back_rank(intent.from) {
            return Err(MoveError::geometry("A pawn cannot be swapped onto a back rank"));
        }

        let mut draft = Draft::begin(ctx.position);
        draft.swap(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Two adjacent friendly pieces trade places.
pub struct Switcheroo;

impl AdvantageResolver for Switcheroo {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::Switcheroo
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &NON_KING)?;
        let other = own_piece(ctx.position, intent.to, color, &NON_KING)?;
        if !is_adjacent(intent.from, intent.to) {
            return Err(MoveError::geometry("Only adjacent pieces can switch places"));
        }
        if (piece == Piece::Pawn && on_back_rank(intent.to))
            || (other == Piece::Pawn && on_back_rank(intent.from))
        {
            return Err(MoveError::geometry("A pawn cannot be switched onto a back rank"));
        }

        let mut draft = Draft::begin(ctx.position);
        draft.swap(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fen_after, run};
    use crate::error::MoveError;
    use crate::game::catalog::AdvantageId;
    use crate::game::resolver::MoveIntent;
    use chess::{Color, Square};

    #[test]
    fn kings_dash_two_squares() {
        let res = run(
            "4k3/8/8/8/8/8/8/4K3 w - - 0 1",
            AdvantageId::KingsDash,
            MoveIntent::new(Color::White, Square::E1, Square::E3),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/8/4K3/8/8 b - - 1 1");
    }

    #[test]
    fn kings_dash_cannot_cross_an_attacked_square() {
        let err = run(
            "4k3/8/8/8/8/8/3r4/4K3 w - - 0 1",
            AdvantageId::KingsDash,
            MoveIntent::new(Color::White, Square::E1, Square::E3),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn kings_dash_not_out_of_check() {
        let err = run(
            "4k3/4r3/8/8/8/8/8/4K3 w - - 0 1",
            AdvantageId::KingsDash,
            MoveIntent::new(Color::White, Square::E1, Square::G1),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn shadow_step_swaps_king_and_piece() {
        let res = run(
            "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
            AdvantageId::ShadowStep,
            MoveIntent::new(Color::White, Square::E1, Square::D1),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/8/8/8/3KQ3 b - - 1 1");
    }

    #[test]
    fn shadow_step_needs_a_friendly_neighbour() {
        let err = run(
            "4k3/8/8/8/8/8/8/3qK3 w - - 0 1",
            AdvantageId::ShadowStep,
            MoveIntent::new(Color::White, Square::E1, Square::D1),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn shadow_step_keeps_pawns_off_back_ranks() {
        let err = run(
            "4k3/8/8/8/8/8/3P4/4K3 w - - 0 1",
            AdvantageId::ShadowStep,
            MoveIntent::new(Color::White, Square::E1, Square::D2),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn switcheroo_swaps_neighbours() {
        let res = run(
            "4k3/8/8/8/8/8/3PN3/4K3 w - - 5 1",
            AdvantageId::Switcheroo,
            MoveIntent::new(Color::White, Square::D2, Square::E2),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/8/8/3NP3/4K3 b - - 0 1");
    }

    #[test]
    fn switcheroo_keeps_pawns_off_back_ranks() {
        let err = run(
            "4k3/8/8/8/8/8/3P4/3NK3 w - - 0 1",
            AdvantageId::Switcheroo,
            MoveIntent::new(Color::White, Square::D2, Square::D1),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn switcheroo_excludes_the_king() {
        let err = run(
            "4k3/8/8/8/8/8/8/3NK3 w - - 0 1",
            AdvantageId::Switcheroo,
            MoveIntent::new(Color::White, Square::D1, Square::E1),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Precondition(_)));
    }
}
