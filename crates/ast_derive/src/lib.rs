use proc_macro::TokenStream;
use quote::{format_ident, quote, quote_spanned};
use syn::{Attribute, Data, DeriveInput, Field, Fields, Index, parse_macro_input, spanned::Spanned};

/// Derives `crate::walk::Walk` by walking every field in declaration order.
///
/// Fields marked `#[walk(skip)]` are not visited.
#[proc_macro_derive(WalkAst, attributes(walk))]
pub fn derive_walk_ast(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let span = input.span();

    let walk_body = match generate_walk_body(&input.data) {
        Ok(body) => body,
        Err(err) => return err.into_compile_error().into(),
    };

    let expanded = quote_spanned! {span =>
        impl<'ast> crate::walk::Walk<'ast> for #name {
            #[inline]
            #[allow(unused_variables)]
            fn walk<V: crate::walk::Visitor<'ast> + ?Sized>(
                &self,
                a: &'ast crate::ast::AstArena,
                v: &mut V
            ) {
                #walk_body
            }
        }
    };

    expanded.into()
}

fn is_skipped(attrs: &[Attribute]) -> syn::Result<bool> {
    let mut skip = false;
    for attr in attrs.iter().filter(|a| a.path().is_ident("walk")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported walk attribute, expected `skip`"))
            }
        })?;
    }
    Ok(skip)
}

fn walked(fields: &Fields) -> syn::Result<Vec<(usize, &Field)>> {
    let mut out = Vec::new();
    for (i, f) in fields.iter().enumerate() {
        if !is_skipped(&f.attrs)? {
            out.push((i, f));
        }
    }
    Ok(out)
}

fn generate_walk_body(data: &Data) -> syn::Result<proc_macro2::TokenStream> {
    match data {
        Data::Struct(data_struct) => generate_fields_walk(&data_struct.fields),
        Data::Enum(data_enum) => {
            let arms = data_enum
                .variants
                .iter()
                .map(|variant| generate_variant_arm(&variant.ident, &variant.fields))
                .collect::<syn::Result<Vec<_>>>()?;

            Ok(quote! {
                match self {
                    #(#arms)*
                }
            })
        }
        Data::Union(u) => Err(syn::Error::new_spanned(
            u.union_token,
            "WalkAst cannot be derived for unions",
        )),
    }
}

fn generate_fields_walk(fields: &Fields) -> syn::Result<proc_macro2::TokenStream> {
    let walk_calls = walked(fields)?.into_iter().map(|(i, field)| {
        let field_access = match &field.ident {
            Some(ident) => quote! { &self.#ident },
            None => {
                let index = Index::from(i);
                quote! { &self.#index }
            }
        };
        quote! { crate::walk::Walk::walk(#field_access, a, v); }
    });

    Ok(quote! { #(#walk_calls)* })
}

fn generate_variant_arm(
    variant_name: &syn::Ident,
    fields: &Fields,
) -> syn::Result<proc_macro2::TokenStream> {
    let kept = walked(fields)?;
    let arm = match fields {
        Fields::Unit => quote! { Self::#variant_name => {} },
        Fields::Named(_) => {
            let bindings = kept.iter().filter_map(|(_, f)| f.ident.as_ref());
            let walk_calls = kept.iter().filter_map(|(_, f)| {
                let name = f.ident.as_ref()?;
                Some(quote! { crate::walk::Walk::walk(#name, a, v); })
            });

            quote! {
                Self::#variant_name { #(#bindings,)* .. } => {
                    #(#walk_calls)*
                }
            }
        }
        Fields::Unnamed(fields_unnamed) => {
            let bindings = (0..fields_unnamed.unnamed.len()).map(|i| {
                if kept.iter().any(|&(k, _)| k == i) {
                    let var = format_ident!("f{}", i);
                    quote! { #var }
                } else {
                    quote! { _ }
                }
            });
            let walk_calls = kept.iter().map(|&(i, _)| {
                let var = format_ident!("f{}", i);
                quote! { crate::walk::Walk::walk(#var, a, v); }
            });

            quote! {
                Self::#variant_name(#(#bindings),*) => {
                    #(#walk_calls)*
                }
            }
        }
    };
    Ok(arm)
}
