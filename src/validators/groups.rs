//! XSD model groups and content model matching
//!
//! A model group (`xs:sequence`, `xs:choice`, `xs:all`) is matched against
//! the child elements of an instance element. Matching is greedy: every
//! particle consumes as many children as its bounds allow, a choice takes
//! the first alternative that consumes input, and nothing is backtracked.

use crate::documents::Element;
use crate::namespaces::QName;

use super::elements::ElementDecl;
use super::particles::Occurs;
use super::schemas::XsdSchema;
use super::wildcards::Wildcard;

/// Maximum nesting of group references followed while matching
const MAX_GROUP_DEPTH: usize = 64;

/// Model group compositor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compositor {
    /// Children in declaration order
    Sequence,
    /// Exactly one alternative
    Choice,
    /// Each particle at most once, in any order
    All,
}

impl Compositor {
    /// Compositor for a schema element local name
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "sequence" => Some(Self::Sequence),
            "choice" => Some(Self::Choice),
            "all" => Some(Self::All),
            _ => None,
        }
    }
}

/// A content model particle
#[derive(Debug, Clone, PartialEq)]
pub enum Particle {
    /// Local element declaration
    Element {
        /// The declaration
        decl: Box<ElementDecl>,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Reference to a global element
    ElementRef {
        /// Referenced name
        name: QName,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Nested model group
    Group(ModelGroup),
    /// Reference to a named group
    GroupRef {
        /// Referenced name
        name: QName,
        /// Occurrence bounds
        occurs: Occurs,
    },
    /// Element wildcard
    Any(Wildcard),
}

/// A model group with its occurrence bounds
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    /// Compositor
    pub compositor: Compositor,
    /// Particles in declaration order
    pub particles: Vec<Particle>,
    /// Occurrence bounds of the group
    pub occurs: Occurs,
}

impl ModelGroup {
    /// Create an empty group occurring once
    pub fn new(compositor: Compositor) -> Self {
        Self {
            compositor,
            particles: Vec::new(),
            occurs: Occurs::once(),
        }
    }

    /// Whether the group has no particles
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Find a local or referenced element declaration by name anywhere in the model
    pub fn find_element<'s>(&'s self, schema: &'s XsdSchema, name: &QName) -> Option<&'s ElementDecl> {
        self.find_element_at(schema, name, 0)
    }

    fn find_element_at<'s>(
        &'s self,
        schema: &'s XsdSchema,
        name: &QName,
        depth: usize,
    ) -> Option<&'s ElementDecl> {
        if depth > MAX_GROUP_DEPTH {
            return None;
        }
        self.particles.iter().find_map(|particle| match particle {
            Particle::Element { decl, .. } if &decl.name == name => Some(decl.as_ref()),
            Particle::ElementRef { name: target, .. } if target == name => schema.element(name),
            Particle::Group(group) => group.find_element_at(schema, name, depth + 1),
            Particle::GroupRef { name: target, .. } => schema
                .group(target)
                .and_then(|group| group.find_element_at(schema, name, depth + 1)),
            _ => None,
        })
    }
}

/// What a child element was matched with
#[derive(Debug, Clone, Copy)]
pub enum Matched<'s> {
    /// An element declaration
    Element(&'s ElementDecl),
    /// An element reference that does not resolve
    Unresolved,
    /// A wildcard
    Wildcard(&'s Wildcard),
}

/// Assignment of one child element to a particle
#[derive(Debug, Clone, Copy)]
pub struct Assignment<'s> {
    /// The particle the child matched
    pub matched: Matched<'s>,
    /// Whether siblings with the same name may occur (the value is an array)
    pub repeats: bool,
}

/// Why a content model did not match
#[derive(Debug, Clone, PartialEq)]
pub struct ModelError {
    /// Index of the offending child; equals the child count when content is missing
    pub position: usize,
    /// Names that would have been accepted at that position
    pub expected: Vec<String>,
}

/// Result of matching children against a model group
#[derive(Debug)]
pub struct ContentMatch<'s> {
    /// Per-child assignment, `None` for children that matched nothing
    pub assignments: Vec<Option<Assignment<'s>>>,
    /// First mismatch, if any
    pub error: Option<ModelError>,
}

/// Match `children` against a content model
pub fn match_content<'s>(
    schema: &'s XsdSchema,
    group: &'s ModelGroup,
    children: &[Element],
) -> ContentMatch<'s> {
    let mut matcher = Matcher {
        schema,
        children,
        assignments: vec![None; children.len()],
        furthest: None,
    };

    let error = match matcher.match_group(group, group.occurs, 0, false, 0) {
        Err(error) => Some(error),
        Ok(pos) if pos < children.len() => {
            let expected = matcher
                .furthest
                .take()
                .filter(|e| e.position == pos)
                .map(|e| e.expected)
                .unwrap_or_default();
            Some(ModelError {
                position: pos,
                expected,
            })
        }
        Ok(_) => None,
    };

    ContentMatch {
        assignments: matcher.assignments,
        error,
    }
}

struct Matcher<'s, 'c> {
    schema: &'s XsdSchema,
    children: &'c [Element],
    assignments: Vec<Option<Assignment<'s>>>,
    furthest: Option<ModelError>,
}

impl<'s, 'c> Matcher<'s, 'c> {
    fn fail(&mut self, position: usize, expected: Vec<String>) -> ModelError {
        let error = ModelError { position, expected };
        match &mut self.furthest {
            Some(furthest) if furthest.position > position => {}
            Some(furthest) if furthest.position == position => {
                for name in &error.expected {
                    if !furthest.expected.contains(name) {
                        furthest.expected.push(name.clone());
                    }
                }
            }
            _ => self.furthest = Some(error.clone()),
        }
        error
    }

    fn reset_from(&mut self, pos: usize) {
        for slot in self.assignments.iter_mut().skip(pos) {
            *slot = None;
        }
    }

    fn match_group(
        &mut self,
        group: &'s ModelGroup,
        occurs: Occurs,
        mut pos: usize,
        repeats: bool,
        depth: usize,
    ) -> Result<usize, ModelError> {
        let repeats = repeats || occurs.is_multiple();
        let mut count = 0;

        while !occurs.is_over(count) {
            match self.match_group_once(group, pos, repeats, depth) {
                Ok(next) if next == pos => {
                    // Matched empty: any remaining minimum is satisfied too
                    count = count.max(occurs.min);
                    break;
                }
                Ok(next) => {
                    pos = next;
                    count += 1;
                }
                Err(error) => {
                    self.reset_from(pos);
                    if occurs.is_missing(count) {
                        return Err(error);
                    }
                    break;
                }
            }
        }

        if occurs.is_missing(count) {
            return Err(self.fail(pos, Vec::new()));
        }
        Ok(pos)
    }

    fn match_group_once(
        &mut self,
        group: &'s ModelGroup,
        mut pos: usize,
        repeats: bool,
        depth: usize,
    ) -> Result<usize, ModelError> {
        match group.compositor {
            Compositor::Sequence => {
                for particle in &group.particles {
                    pos = self.match_particle(particle, pos, repeats, depth)?;
                }
                Ok(pos)
            }
            Compositor::Choice => {
                let mut empty_match = false;
                let mut expected = Vec::new();
                for particle in &group.particles {
                    match self.match_particle(particle, pos, repeats, depth) {
                        Ok(next) if next > pos => return Ok(next),
                        Ok(_) => empty_match = true,
                        Err(error) => {
                            self.reset_from(pos);
                            expected.extend(error.expected);
                        }
                    }
                }
                if empty_match || group.particles.is_empty() {
                    Ok(pos)
                } else {
                    Err(self.fail(pos, expected))
                }
            }
            Compositor::All => {
                let mut used = vec![false; group.particles.len()];
                loop {
                    let mut progressed = false;
                    for (i, particle) in group.particles.iter().enumerate() {
                        if used[i] {
                            continue;
                        }
                        match self.match_particle(particle, pos, repeats, depth) {
                            Ok(next) if next > pos => {
                                used[i] = true;
                                pos = next;
                                progressed = true;
                                break;
                            }
                            Ok(_) => {}
                            Err(_) => self.reset_from(pos),
                        }
                    }
                    if !progressed || pos >= self.children.len() {
                        break;
                    }
                }

                let missing: Vec<String> = group
                    .particles
                    .iter()
                    .zip(&used)
                    .filter(|(particle, used)| !**used && !self.is_emptiable(particle, depth))
                    .map(|(particle, _)| self.particle_name(particle))
                    .collect();
                if missing.is_empty() {
                    Ok(pos)
                } else {
                    Err(self.fail(pos, missing))
                }
            }
        }
    }

    fn match_particle(
        &mut self,
        particle: &'s Particle,
        pos: usize,
        repeats: bool,
        depth: usize,
    ) -> Result<usize, ModelError> {
        match particle {
            Particle::Element { decl, occurs } => {
                let matched = Matched::Element(decl.as_ref());
                self.match_elements(&decl.name, matched, *occurs, pos, repeats)
            }
            Particle::ElementRef { name, occurs } => {
                let matched = self
                    .schema
                    .element(name)
                    .map_or(Matched::Unresolved, Matched::Element);
                self.match_elements(name, matched, *occurs, pos, repeats)
            }
            Particle::Group(group) => self.match_group(group, group.occurs, pos, repeats, depth),
            Particle::GroupRef { name, occurs } => {
                if depth >= MAX_GROUP_DEPTH {
                    return Err(self.fail(pos, Vec::new()));
                }
                match self.schema.group(name) {
                    Some(group) => self.match_group(group, *occurs, pos, repeats, depth + 1),
                    None => Ok(pos),
                }
            }
            Particle::Any(wildcard) => {
                let repeats = repeats || wildcard.occurs.is_multiple();
                let mut pos = pos;
                let mut count = 0;
                while pos < self.children.len()
                    && !wildcard.occurs.is_over(count)
                    && wildcard.matches(self.children[pos].namespace())
                {
                    self.assignments[pos] = Some(Assignment {
                        matched: Matched::Wildcard(wildcard),
                        repeats,
                    });
                    pos += 1;
                    count += 1;
                }
                if wildcard.occurs.is_missing(count) {
                    return Err(self.fail(pos, vec!["any element".to_string()]));
                }
                Ok(pos)
            }
        }
    }

    fn match_elements(
        &mut self,
        name: &QName,
        matched: Matched<'s>,
        occurs: Occurs,
        mut pos: usize,
        repeats: bool,
    ) -> Result<usize, ModelError> {
        let repeats = repeats || occurs.is_multiple();
        let mut count = 0;
        while pos < self.children.len()
            && !occurs.is_over(count)
            && &self.children[pos].qname == name
        {
            self.assignments[pos] = Some(Assignment { matched, repeats });
            pos += 1;
            count += 1;
        }
        if occurs.is_missing(count) {
            return Err(self.fail(pos, vec![name.to_string()]));
        }
        Ok(pos)
    }

    fn is_emptiable(&self, particle: &Particle, depth: usize) -> bool {
        match particle {
            Particle::Element { occurs, .. } | Particle::ElementRef { occurs, .. } => {
                occurs.is_emptiable()
            }
            Particle::Any(wildcard) => wildcard.occurs.is_emptiable(),
            Particle::Group(group) => {
                group.occurs.is_emptiable() || self.group_is_emptiable(group, depth)
            }
            Particle::GroupRef { name, occurs } => {
                occurs.is_emptiable()
                    || depth >= MAX_GROUP_DEPTH
                    || self
                        .schema
                        .group(name)
                        .map_or(true, |group| self.group_is_emptiable(group, depth + 1))
            }
        }
    }

    fn group_is_emptiable(&self, group: &ModelGroup, depth: usize) -> bool {
        match group.compositor {
            Compositor::Choice => {
                group.particles.is_empty()
                    || group.particles.iter().any(|p| self.is_emptiable(p, depth))
            }
            _ => group.particles.iter().all(|p| self.is_emptiable(p, depth)),
        }
    }

    fn particle_name(&self, particle: &Particle) -> String {
        match particle {
            Particle::Element { decl, .. } => decl.name.to_string(),
            Particle::ElementRef { name, .. } | Particle::GroupRef { name, .. } => name.to_string(),
            Particle::Group(_) => "group".to_string(),
            Particle::Any(_) => "any element".to_string(),
        }
    }
}
