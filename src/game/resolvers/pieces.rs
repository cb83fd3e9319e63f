use chess::{Color, Piece, Square};

use super::{
    conclude, delta, is_knight_leap, own_piece, require_empty, require_open_or_enemy, used_state,
};
use crate::board::position::rook_home;
use crate::board::{forward, offset, CastleSide};
use crate::error::MoveError;
use crate::game::catalog::AdvantageId;
use crate::game::draft::Draft;
use crate::game::resolver::{AdvantageResolver, MoveIntent, ResolveContext, Resolution};
use crate::game::state::AdvantageState;

/// Knight leap of three squares by one.
pub struct CamelKnights;

impl AdvantageResolver for CamelKnights {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::CamelKnights
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &[Piece::Knight])?;
        let (df, dr) = delta(intent.from, intent.to);
        if !matches!((df.abs(), dr.abs()), (3, 1) | (1, 3)) {
            return Err(MoveError::geometry("A camel leaps three squares by one"));
        }
        require_open_or_enemy(ctx.position, intent.to, intent.color)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Slide along a line, passing through friendly pieces; the first enemy on
/// the line stops the slide and can be captured.
fn phase_slide(
    ctx: &ResolveContext<'_>,
    intent: &MoveIntent,
    kind: Piece,
    diagonal: bool,
) -> Result<Resolution, MoveError> {
    let color = intent.color;
    let piece = own_piece(ctx.position, intent.from, color, &[kind])?;
    let (df, dr) = delta(intent.from, intent.to);
    let on_line = if diagonal {
        df != 0 && df.abs() == dr.abs()
    } else {
        (df == 0) != (dr == 0)
    };
    if !on_line {
        return Err(MoveError::geometry("Destination is not on a line of movement"));
    }

    let (sf, sr) = (df.signum(), dr.signum());
    let steps = df.abs().max(dr.abs());
    for i in 1..steps {
        let square = offset(intent.from, sf * i, sr * i)
            .ok_or_else(|| MoveError::geometry("Off-board square"))?;
        if matches!(ctx.position.color_on(square), Some(c) if c != color) {
            return Err(MoveError::geometry(format!("Blocked by an enemy piece on {}", square)));
        }
    }
    require_open_or_enemy(ctx.position, intent.to, color)?;

    let mut draft = Draft::begin(ctx.position);
    draft.relocate(intent.from, intent.to)?;
    conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
}

pub struct PhasingBishops;

impl AdvantageResolver for PhasingBishops {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::PhasingBishops
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        phase_slide(ctx, intent, Piece::Bishop, true)
    }
}

pub struct GhostRooks;

impl AdvantageResolver for GhostRooks {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::GhostRooks
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        phase_slide(ctx, intent, Piece::Rook, false)
    }
}

/// One orthogonal step, which moves the bishop to the other square color.
pub struct ChameleonBishop;

impl AdvantageResolver for ChameleonBishop {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::ChameleonBishop
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &[Piece::Bishop])?;
        let (df, dr) = delta(intent.from, intent.to);
        if df.abs() + dr.abs() != 1 {
            return Err(MoveError::geometry("The bishop steps one square orthogonally"));
        }
        require_empty(ctx.position, intent.to)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Queen moves like a knight.
pub struct AmazonQueen;

impl AdvantageResolver for AmazonQueen {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::AmazonQueen
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &[Piece::Queen])?;
        if !is_knight_leap(intent.from, intent.to) {
            return Err(MoveError::geometry("The queen must move like a knight"));
        }
        require_open_or_enemy(ctx.position, intent.to, intent.color)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// Jump exactly one diagonally adjacent piece.
pub struct BishopHop;

impl AdvantageResolver for BishopHop {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::BishopHop
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let piece = own_piece(ctx.position, intent.from, intent.color, &[Piece::Bishop])?;
        let (df, dr) = delta(intent.from, intent.to);
        if df.abs() != 2 || dr.abs() != 2 {
            return Err(MoveError::geometry("A hop lands two squares away diagonally"));
        }
        let jumped = offset(intent.from, df / 2, dr / 2)
            .ok_or_else(|| MoveError::geometry("Off-board square"))?;
        if ctx.position.is_empty(jumped) {
            return Err(MoveError::geometry(format!("Nothing to hop over on {}", jumped)));
        }
        require_open_or_enemy(ctx.position, intent.to, intent.color)?;

        let mut draft = Draft::begin(ctx.position);
        draft.relocate(intent.from, intent.to)?;
        conclude(ctx, intent, draft, used_state(ctx)?, piece, None)
    }
}

/// A corner rook vaults the pawn in front of it, which is taken off the
/// board. Each rook may vault once.
pub struct CornerVault;

fn on_home_corner(color: Color, square: Square) -> bool {
    [CastleSide::King, CastleSide::Queen]
        .iter()
        .any(|side| rook_home(color, *side) == square)
}

impl AdvantageResolver for CornerVault {
    fn advantage(&self) -> AdvantageId {
        AdvantageId::CornerVault
    }

    fn resolve(&self, ctx: &ResolveContext<'_>, intent: &MoveIntent) -> Result<Resolution, MoveError> {
        let color = intent.color;
        let piece = own_piece(ctx.position, intent.from, color, &[Piece::Rook])?;
        if !on_home_corner(color, intent.from) {
            return Err(MoveError::precondition("Only a rook on its home corner can vault"));
        }
        let uid = ctx.tracker.uid_at(intent.from).ok_or_else(|| {
            MoveError::reconstruction(format!("No identity for the rook on {}", intent.from))
        })?;
        let mut state = ctx.state.clone();
        match &mut state {
            AdvantageState::CornerVault { vaulted } if vaulted.contains(&uid) => {
                return Err(MoveError::precondition("This rook has already vaulted"))
            }
            AdvantageState::CornerVault { vaulted } => vaulted.push(uid),
            _ => return Err(MoveError::precondition("Corner vault is not your advantage")),
        }

        let dir = forward(color);
        let pawn_square = offset(intent.from, 0, dir)
            .ok_or_else(|| MoveError::geometry("Off-board square"))?;
        if ctx.position.get(pawn_square) != Some((Piece::Pawn, color)) {
            return Err(MoveError::geometry(format!(
                "No friendly pawn on {} to vault",
                pawn_square
            )));
        }
        let two = offset(intent.from, 0, 2 * dir);
        let three = offset(intent.from, 0, 3 * dir);
        if Some(intent.to) == three {
            if let Some(between) = two {
                require_empty(ctx.position, between)?;
            }
        } else if Some(intent.to) != two {
            return Err(MoveError::geometry("A vault lands two or three ranks ahead"));
        }
        require_empty(ctx.position, intent.to)?;

        let mut draft = Draft::begin(ctx.position);
        draft.remove(pawn_square)?;
        draft.relocate(intent.from, intent.to)?;
        let effect = format!("Rook vaulted over {}; the pawn was lost", pawn_square);
        conclude(ctx, intent, draft, state, piece, Some(effect))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fen_after, run, run_with};
    use crate::error::MoveError;
    use crate::game::catalog::AdvantageId;
    use crate::game::resolver::MoveIntent;
    use crate::game::state::AdvantageState;
    use chess::{Color, Square};

    #[test]
    fn camel_leaps_three_by_one() {
        let res = run(
            "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1",
            AdvantageId::CamelKnights,
            MoveIntent::new(Color::White, Square::B1, Square::C4),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/2N5/8/8/4K3 b - - 1 1");
    }

    #[test]
    fn camel_rejects_ordinary_knight_jump() {
        let err = run(
            "4k3/8/8/8/8/8/8/1N2K3 w - - 0 1",
            AdvantageId::CamelKnights,
            MoveIntent::new(Color::White, Square::B1, Square::C3),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn ghost_rook_passes_friendly_pieces() {
        let res = run(
            "4k3/8/8/8/8/8/P7/R3K3 w Q - 0 1",
            AdvantageId::GhostRooks,
            MoveIntent::new(Color::White, Square::A1, Square::A5),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/R7/8/8/P7/4K3 b - - 1 1");
    }

    #[test]
    fn ghost_rook_stops_at_the_first_enemy() {
        let fen = "4k3/8/8/8/p7/8/P7/R3K3 w - - 0 1";
        let err = run(
            fen,
            AdvantageId::GhostRooks,
            MoveIntent::new(Color::White, Square::A1, Square::A5),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));

        let res = run(
            fen,
            AdvantageId::GhostRooks,
            MoveIntent::new(Color::White, Square::A1, Square::A4),
        )
        .unwrap();
        assert!(res.finished.flags.capture);
    }

    #[test]
    fn phasing_bishop_slides_through_own_pawn() {
        let res = run(
            "4k3/8/8/8/8/8/1P6/B3K3 w - - 0 1",
            AdvantageId::PhasingBishops,
            MoveIntent::new(Color::White, Square::A1, Square::D4),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/3B4/8/1P6/4K3 b - - 1 1");
        assert_eq!(res.state.unwrap().remaining_uses(), Some(2));
    }

    #[test]
    fn chameleon_bishop_changes_square_color() {
        let res = run(
            "4k3/8/8/8/3B4/8/8/4K3 w - - 0 1",
            AdvantageId::ChameleonBishop,
            MoveIntent::new(Color::White, Square::D4, Square::D5),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/3B4/8/8/8/4K3 b - - 1 1");
        assert_eq!(res.state.unwrap().remaining_uses(), Some(0));
    }

    #[test]
    fn amazon_queen_jumps() {
        let res = run(
            "4k3/8/8/8/8/8/8/3QK3 w - - 0 1",
            AdvantageId::AmazonQueen,
            MoveIntent::new(Color::White, Square::D1, Square::C3),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/8/2Q5/8/4K3 b - - 1 1");
    }

    #[test]
    fn amazon_queen_needs_the_queen() {
        let err = run(
            "4k3/8/8/8/8/8/8/3RK3 w - - 0 1",
            AdvantageId::AmazonQueen,
            MoveIntent::new(Color::White, Square::D1, Square::C3),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Precondition(_)));
    }

    #[test]
    fn bishop_hops_an_adjacent_piece() {
        let fen = "4k3/8/8/8/8/8/1P6/B3K3 w - - 0 1";
        let res = run(
            fen,
            AdvantageId::BishopHop,
            MoveIntent::new(Color::White, Square::A1, Square::C3),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/8/2B5/1P6/4K3 b - - 1 1");

        let err = run(
            "4k3/8/8/8/8/8/8/B3K3 w - - 0 1",
            AdvantageId::BishopHop,
            MoveIntent::new(Color::White, Square::A1, Square::C3),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }

    #[test]
    fn corner_vault_removes_the_pawn_and_castling() {
        let res = run(
            "4k3/8/8/8/8/8/P7/R3K3 w Q - 3 1",
            AdvantageId::CornerVault,
            MoveIntent::new(Color::White, Square::A1, Square::A4),
        )
        .unwrap();
        assert_eq!(fen_after(&res), "4k3/8/8/8/R7/8/8/4K3 b - - 0 1");
        assert_eq!(
            res.state,
            Some(AdvantageState::CornerVault { vaulted: vec![1] })
        );
    }

    #[test]
    fn corner_vault_once_per_rook() {
        let used = AdvantageState::CornerVault { vaulted: vec![1] };
        let err = run_with(
            "4k3/8/8/8/8/8/P7/R3K3 w Q - 0 1",
            &used,
            MoveIntent::new(Color::White, Square::A1, Square::A3),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Precondition(_)));
    }

    #[test]
    fn corner_vault_range_is_two_or_three() {
        let err = run(
            "4k3/8/8/8/8/8/P7/R3K3 w Q - 0 1",
            AdvantageId::CornerVault,
            MoveIntent::new(Color::White, Square::A1, Square::A5),
        )
        .unwrap_err();
        assert!(matches!(err, MoveError::Geometry(_)));
    }
}
