//! Shared Lua helpers referenced by node templates.
//!
//! Templates name the helpers they call in [`Fragment::helpers`]; the
//! compiler collects those names and emits each definition once into
//! `src/helpers.lua`, in the order listed here.
//!
//! [`Fragment::helpers`]: super::Fragment::helpers

use std::collections::BTreeSet;

/// Name of the Lua local every generated file binds the helper table to.
pub const TABLE: &str = "H";

#[derive(Debug, Clone, Copy)]
pub struct Helper {
    pub name: &'static str,
    pub source: &'static str,
}

pub const MERGE_RETURN: &str = "merge_return";
pub const CREATE_CARD: &str = "create_card";
pub const DESTROY_CARD: &str = "destroy_card";
pub const COMPARE: &str = "compare";
pub const BLIND_TYPE: &str = "blind_type";
pub const MESSAGE: &str = "message";

pub const HELPERS: &[Helper] = &[
    Helper {
        name: MERGE_RETURN,
        source: r#"function H.merge_return(ret, effect)
    for k, v in pairs(effect) do
        if k == "xmult" and ret.xmult then
            ret.xmult = ret.xmult * v
        elseif type(v) == "number" and type(ret[k]) == "number" then
            ret[k] = ret[k] + v
        else
            ret[k] = v
        end
    end
    return ret
end"#,
    },
    Helper {
        name: CREATE_CARD,
        source: r#"function H.create_card(args)
    local joker = args.set == "Joker"
    local area = joker and G.jokers or G.consumeables
    local buffer = joker and "joker_buffer" or "consumeable_buffer"
    if #area.cards + (G.GAME[buffer] or 0) >= area.config.card_limit then
        return false
    end
    G.GAME[buffer] = (G.GAME[buffer] or 0) + 1
    G.E_MANAGER:add_event(Event({
        func = function()
            SMODS.add_card(args)
            G.GAME[buffer] = 0
            return true
        end,
    }))
    return true
end"#,
    },
    Helper {
        name: DESTROY_CARD,
        source: r#"function H.destroy_card(card)
    if not card or card.getting_sliced then
        return
    end
    card.getting_sliced = true
    G.E_MANAGER:add_event(Event({
        func = function()
            if SMODS.destroy_cards then
                SMODS.destroy_cards(card)
            else
                card:start_dissolve()
            end
            return true
        end,
    }))
end"#,
    },
    Helper {
        name: COMPARE,
        source: r#"function H.compare(a, op, b)
    if op == "equals" then return a == b end
    if op == "not_equals" then return a ~= b end
    if op == "greater_than" then return a > b end
    if op == "less_than" then return a < b end
    if op == "greater_or_equal" then return a >= b end
    if op == "less_or_equal" then return a <= b end
    return false
end"#,
    },
    Helper {
        name: BLIND_TYPE,
        source: r#"function H.blind_type()
    local blind = G.GAME.blind
    if not blind then return nil end
    if blind.boss then return "boss" end
    if blind.name == "Big Blind" then return "big" end
    return "small"
end"#,
    },
    Helper {
        name: MESSAGE,
        source: r#"function H.message(card, text, colour)
    card_eval_status_text(card, "extra", nil, nil, nil, { message = text, colour = colour })
end"#,
    },
];

pub fn get(name: &str) -> Option<&'static Helper> {
    HELPERS.iter().find(|h| h.name == name)
}

/// Render `src/helpers.lua` containing exactly the used helpers.
pub fn render(used: &BTreeSet<&'static str>) -> String {
    let mut out = format!("local {TABLE} = {{}}\n");
    for helper in HELPERS.iter().filter(|h| used.contains(h.name)) {
        out.push('\n');
        out.push_str(helper.source);
        out.push('\n');
    }
    out.push_str(&format!("\nreturn {TABLE}\n"));
    out
}
